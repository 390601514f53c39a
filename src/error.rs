#[derive(Debug, thiserror::Error)]
pub enum NvsharptopError {
    #[error("Failed to launch query tool: {0}")]
    Launch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

pub type Result<T> = std::result::Result<T, NvsharptopError>;
