//! I/O helpers for the bootstrap orchestrator.

pub mod config;
pub mod discovery;
pub mod process;
pub mod shell;
pub mod toolchain;
