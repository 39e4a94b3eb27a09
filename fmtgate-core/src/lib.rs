//! fmtgate core library: domain types, file routing, configuration, errors.
//!
//! - [`types`]: file sets, tool names, per-tool and aggregated results
//! - [`router`]: extension-based bucketing with a permanent ignore list
//! - [`config`]: `.fmtgate.yaml` loading and override resolution
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod router;
pub mod types;

pub use config::{Config, Overrides};
pub use error::ConfigError;
pub use router::{Router, Routes};
pub use types::{FileSet, Mode, RunOutcome, ToolInvocationResult, ToolName};
