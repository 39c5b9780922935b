//! 3-gram prefilter for the fuzzy filter stage.
//!
//! Fuzzy ranking every line of a project is expensive. Before piping into
//! the fuzzy filter the grep stage only keeps lines containing at least one
//! of three representative 3-character fragments of the query.

use smallvec::SmallVec;

pub const GRAM_LEN: usize = 3;

/// All overlapping 3-character substrings, in order. Character based, so
/// multi-byte text never splits inside a code point.
pub fn trigrams(text: &str) -> Vec<&str> {
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .collect();

    if boundaries.len() <= GRAM_LEN {
        return Vec::new();
    }

    boundaries
        .windows(GRAM_LEN + 1)
        .map(|w| &text[w[0]..w[GRAM_LEN]])
        .collect()
}

/// First, middle and last 3-gram, deduplicated in that order. Empty when
/// the text is shorter than 3 characters.
pub fn representative_trigrams(text: &str) -> SmallVec<[&str; 3]> {
    let grams = trigrams(text);
    let mut picked: SmallVec<[&str; 3]> = SmallVec::new();

    let (Some(first), Some(last)) = (grams.first(), grams.last()) else {
        return picked;
    };

    for gram in [*first, grams[grams.len() / 2], *last] {
        if !picked.contains(&gram) {
            picked.push(gram);
        }
    }

    picked
}
