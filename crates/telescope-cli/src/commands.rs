use telescope_core::{EngineEvent, SessionKey};

/// One line typed on stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the query text
    Query(String),
    Move(i64),
    Select(usize),
    Confirm,
    Cancel,
    Help,
}

pub const HELP: &str = "\
type a query and press enter to search
  :n / :p     next / previous result
  :j <index>  highlight result <index>
  :o          open the highlighted result and exit
  :q          cancel and exit
  :: <text>   search text starting with ':'";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\n', '\r']);

        if let Some(text) = line.strip_prefix(":: ") {
            return Command::Query(text.to_string());
        }

        let Some(command) = line.strip_prefix(':') else {
            return Command::Query(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("n"), None) => Command::Move(1),
            (Some("p"), None) => Command::Move(-1),
            (Some("n"), Some(count)) => count.parse().map_or(Command::Help, Command::Move),
            (Some("p"), Some(count)) => count
                .parse::<i64>()
                .map_or(Command::Help, |c| Command::Move(-c)),
            (Some("j"), Some(index)) => index.parse().map_or(Command::Help, Command::Select),
            (Some("o"), None) => Command::Confirm,
            (Some("q"), None) => Command::Cancel,
            _ => Command::Help,
        }
    }

    /// The engine event for this command, `None` for local commands
    pub fn into_event<H>(self, session: SessionKey) -> Option<EngineEvent<H>> {
        Some(match self {
            Command::Query(query) => EngineEvent::QueryEdited { session, query },
            Command::Move(delta) => EngineEvent::Navigate { session, delta },
            Command::Select(index) => EngineEvent::Highlight { session, index },
            Command::Confirm => EngineEvent::Dismiss {
                session,
                confirm: true,
            },
            Command::Cancel => EngineEvent::Dismiss {
                session,
                confirm: false,
            },
            Command::Help => return None,
        })
    }

    pub fn ends_session(&self) -> bool {
        matches!(self, Command::Confirm | Command::Cancel)
    }
}
