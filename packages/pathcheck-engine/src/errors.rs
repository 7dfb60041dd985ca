//! Error types for pathcheck-engine
//!
//! Provides unified error handling across the crate. Analysis findings are
//! not errors: bad states reached on feasible paths come back as
//! diagnostics inside a successful outcome. This type covers the cases
//! where the engine cannot produce an outcome at all.

use thiserror::Error;

use crate::features::path_explorer::infrastructure::CfgError;
use crate::features::state_machine::infrastructure::ParseError;

/// Main error type for pathcheck-engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Structural validation rejected the input CFG
    #[error("validation error: {0}")]
    Validation(CfgError),

    /// Machine definition could not be parsed
    #[error("parse error: {0}")]
    Parse(ParseError),

    /// Registered machines are inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// Analysis error
    #[error("analysis error: {0}")]
    Analysis(String),
}

impl From<CfgError> for EngineError {
    fn from(err: CfgError) -> Self {
        EngineError::Validation(err)
    }
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        EngineError::Parse(err)
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
