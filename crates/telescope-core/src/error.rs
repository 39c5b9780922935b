use crate::session::SessionKey;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Process {0} has no stdout pipe")]
    MissingStdout(String),
    #[error("Failed to convert grep stdout into the filter's stdin: {0}")]
    PipeHandoff(#[source] std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Unknown search session {0:?}")]
    UnknownSession(SessionKey),
    #[error("Could not resolve the home directory")]
    HomeDirMissing,
    #[error("Failed to initialize tracing: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, Error>;
