//! Subprocess plumbing shared by the adapters.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use fmtgate_core::{FileSet, ToolName};

use crate::error::ToolError;

/// A resolved tool executable bound to the directory it runs in.
#[derive(Debug, Clone)]
pub(crate) struct ToolProcess {
    tool: ToolName,
    program: PathBuf,
    root: PathBuf,
}

impl ToolProcess {
    pub(crate) fn new(tool: ToolName, program: PathBuf, root: &Path) -> Self {
        Self {
            tool,
            program,
            root: root.to_path_buf(),
        }
    }

    /// Human-readable command line, for logs and errors.
    pub(crate) fn describe(&self, args: &[&str], files: &FileSet) -> String {
        format!("{} {} <{} file(s)>", self.tool, args.join(" "), files.len())
    }

    /// Run to completion capturing stdout/stderr. Exit status is not judged:
    /// check-mode tools signal findings through it.
    pub(crate) fn output(&self, args: &[&str], files: &FileSet) -> Result<Output, ToolError> {
        let command = self.describe(args, files);
        tracing::debug!("{command} (in {})", self.root.display());
        Command::new(&self.program)
            .current_dir(&self.root)
            .args(args)
            .args(files.iter())
            .output()
            .map_err(|source| ToolError::Spawn {
                tool: self.tool,
                command,
                source,
            })
    }

    /// Like [`output`](Self::output) but any non-zero exit is fatal.
    pub(crate) fn run_checked(&self, args: &[&str], files: &FileSet) -> Result<Output, ToolError> {
        let output = self.output(args, files)?;
        if !output.status.success() {
            return Err(self.failed(args, files, &output));
        }
        Ok(output)
    }

    pub(crate) fn failed(&self, args: &[&str], files: &FileSet, output: &Output) -> ToolError {
        ToolError::Failed {
            tool: self.tool,
            command: self.describe(args, files),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

pub(crate) fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub(crate) fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
