use thiserror::Error;

/// Errors surfaced to the host. Internal inconsistencies (two kings on
/// one side, boards overlapping) are bugs and panic instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid move `{0}`")]
    InvalidMove(String),

    #[error("invalid promotion piece `{0}`")]
    InvalidPromotionChar(char),
}
