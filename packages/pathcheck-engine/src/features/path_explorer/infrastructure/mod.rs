/*
 * Path-Explorer Infrastructure
 *
 * Structural validation of incoming CFGs.
 */

pub mod validation;

pub use validation::{CfgError, ValidationResult};
