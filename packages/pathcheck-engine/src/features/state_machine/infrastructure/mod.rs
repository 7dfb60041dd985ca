/*
 * State-Machine Infrastructure
 *
 * Built-in machine definitions and parsers.
 */

mod built_in;
mod machine_parser;

pub use built_in::HeapMachine;
pub use machine_parser::{
    AssumeConfig, BadOutcomeConfig, ContradictionConfig, MachineBuilder, MachineConfig,
    MachineParser, ParseError, TransitionConfig,
};
