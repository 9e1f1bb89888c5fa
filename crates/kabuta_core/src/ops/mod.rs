//! One function per Delve RPC the bridge issues.

pub mod breakpoint;
pub mod goroutines;
pub mod stacktrace;
pub mod thread;

pub use breakpoint::create_breakpoint;
pub use goroutines::list_goroutines;
pub use stacktrace::stacktrace;
pub use thread::get_thread;
