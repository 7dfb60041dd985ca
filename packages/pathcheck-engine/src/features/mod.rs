/*
 * Analysis Features
 *
 * Feature-sliced modules, each with domain / application / infrastructure
 * layers.
 */

pub mod path_explorer;
pub mod state_machine;
