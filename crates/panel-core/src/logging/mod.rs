//! Logging abstractions
//!
//! Components receive an `Arc<dyn Logger>` and never write to the console
//! directly, so hosts decide where lines go.

mod traits;
mod noop;
mod console;
mod memory;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use memory::{LogLevel, MemoryLogger};
