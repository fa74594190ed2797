//! Deterministic, pure logic shared by the bootstrap orchestrator.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data (directory listings, file contents, captured output) and return
//! deterministic results suitable for tests.

pub mod accelerator;
pub mod aliases;
pub mod budget;
pub mod classifier;
pub mod entry;
pub mod imports;
pub mod manifest;
pub mod readme;
pub mod types;
