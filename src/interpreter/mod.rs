pub mod context;
mod tree;

pub use tree::{TreeWalkInterpreter, MAX_CALL_DEPTH};

/// Where `print` statements send their text. Programs run on a worker
/// thread, so the context must be movable across threads.
pub trait SystemContext: Send {
    fn writeln(&mut self, text: &str);
}
