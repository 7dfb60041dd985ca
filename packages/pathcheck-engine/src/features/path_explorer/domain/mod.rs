/*
 * Path-Explorer Domain Models
 *
 * Per-path abstract state and the identities it tracks.
 */

mod path_state;

pub use path_state::{Fact, PathState, TrackedValue};
