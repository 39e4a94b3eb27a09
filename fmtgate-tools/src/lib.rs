//! # fmtgate-tools
//!
//! Adapters around the external formatters and the pipeline that drives them.
//!
//! Build a [`Pipeline`] from a [`RepositoryInspector`](fmtgate_repo::RepositoryInspector),
//! a [`Router`](fmtgate_core::Router) and [`default_adapters`], then call
//! [`Pipeline::run`].

pub mod adapter;
pub mod clang_format;
pub mod error;
pub mod pipeline;
mod process;
pub mod ruff;

pub use adapter::ToolAdapter;
pub use clang_format::ClangFormatAdapter;
pub use error::{PipelineError, ToolError};
pub use pipeline::{default_adapters, FileSelection, Pipeline, PipelineOutcome};
pub use ruff::RuffAdapter;
