//! Built-in tools for Gena.
//!
//! Small, dependency-free capabilities used by the CLI and handy for
//! trying an agent out: the current time, a square root, and a middleware
//! that logs every invocation.

pub mod current_time;
pub mod logging;
pub mod square_root;

use gena_core::tool::Tool;

pub use current_time::CurrentTimeHandler;
pub use logging::LoggingMiddleware;
pub use square_root::SquareRootParams;

/// All built-in tools, in the order they are advertised to the model.
pub fn default_tools() -> Vec<Tool> {
    vec![
        current_time::tool(),
        square_root::tool().with_middleware(LoggingMiddleware),
    ]
}
