/// Core error type for the AML bot.
///
/// Adapter crates map their specific errors (reqwest, teloxide) into this type so the
/// dispatcher can decide consistently what the user sees and what only goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("AML service error: {0}")]
    Upstream(String),

    #[error("AML response decode error: {0}")]
    Decode(String),

    #[error("failed to send message: {0}")]
    Send(String),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("external error: {0}")]
    External(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
