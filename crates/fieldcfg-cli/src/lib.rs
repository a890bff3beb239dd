//! # fieldcfg-cli
//!
//! Library half of the `fieldcfg` binary: the config types it manages and
//! the `--set` assignment logic.  Kept out of `main.rs` so both can be
//! exercised by unit tests.

pub mod app;
pub mod assign;
