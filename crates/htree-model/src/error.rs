//! Error types for the model crate

/// Errors raised while validating model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Identifier is empty or not a `.`-separated list of integers
    #[error("invalid dotted id: '{0}'")]
    InvalidDottedId(String),
}
