//! Code generator: walks a validated AST and emits stack-VM assembly text.
//! Split into submodules by concern: shared state, type/layout resolution,
//! symbol-table population, and statement/expression emission.

mod control_flow;
mod globals;
mod program;
mod state;
mod types;

pub use program::generate;
