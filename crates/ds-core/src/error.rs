use thiserror::Error;

/// Failure to turn a raw string into a [`crate::path::PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("malformed property path `{path}` at offset {offset}")]
    Malformed { path: String, offset: usize },
    #[error("unknown property `{0}`")]
    Unknown(String),
}
