use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("empty value for {0}")]
    Empty(&'static str),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
