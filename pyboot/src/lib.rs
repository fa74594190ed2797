//! Adaptive bootstrap for unfamiliar Python projects.
//!
//! Picks an entry script, provisions an optional isolated environment,
//! installs declared and inferred dependencies, then runs the entry and heals
//! missing-module failures until it runs cleanly or the retry budget is spent.
//!
//! - **[`core`]**: Pure, deterministic logic (entry ranking, alias table,
//!   README and import extraction, outcome classification). No I/O.
//! - **[`io`]**: Side-effecting operations (process execution, filesystem
//!   discovery, config loading). Isolated behind seams for tests.
//!
//! Orchestration modules ([`select`], [`plan`], [`install`], [`probe`],
//! [`bootstrap`]) coordinate core logic with I/O.

pub mod bootstrap;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod install;
pub mod io;
pub mod logging;
pub mod plan;
pub mod probe;
pub mod select;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
