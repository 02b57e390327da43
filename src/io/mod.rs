pub mod input;

pub use input::{InteractiveSource, LineSource, ScriptSource};
