//! Stable exit codes for the `pyboot` CLI.

/// The entry ran cleanly, survived its wait budget, or `--plan` printed.
pub const OK: i32 = 0;
/// Entry not found or ambiguous, invalid configuration, unsupported
/// accelerator version, or run budget exhausted.
pub const FAILED: i32 = 1;
