//! txwatch-engine: poll loop and parser facade.

pub mod builder;
pub mod parser;
pub mod poll_loop;

pub use builder::ParserBuilder;
pub use parser::Parser;
pub use poll_loop::{EngineContext, PollLoop, TickOutcome};
