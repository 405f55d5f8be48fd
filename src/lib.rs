//! Terminal client pieces for a container daemon: a live renderer for build
//! and pull progress streams, and interactive attachment to a remote
//! process's stdio.

pub mod attach;
pub mod cli;
pub mod config;
pub mod error;
pub mod escape;
pub mod logging;
pub mod progress;

pub use error::{AttachError, ProgressError};
