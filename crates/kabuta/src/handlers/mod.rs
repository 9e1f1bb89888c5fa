//! One function per GDB/MI command, grouped by area.

pub mod breakpoints;
pub mod environment;
pub mod exec;
pub mod gdb;
pub mod stack;
pub mod threads;
