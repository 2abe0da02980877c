//! The Scripting Interface: the engine's out-of-process messaging boundary.

pub mod interface;
pub mod wire;

pub use interface::ScriptingInterface;
