//! Subprocess invocation for the external tools (scrub.py, mk_prepare_ligand.py,
//! vina, boltz).

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::error::{LigscreenError, Result};

/// Captured result of one external tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Convert a non-zero exit into [`LigscreenError::ToolFailed`].
    pub fn into_result(self, tool: &str) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(LigscreenError::ToolFailed {
                tool: tool.to_string(),
                code: self.status_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Run `program` with `args` and wait for it.
///
/// A non-zero exit status is reported through [`ToolOutput::success`], not as an
/// error; only a program that cannot be found or spawned is an `Err`.
pub async fn run_tool<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    debug!(program, "Spawning external tool");

    let output = match command.output().await {
        Ok(o) => o,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(LigscreenError::ToolNotFound {
                tool: program.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    Ok(ToolOutput {
        status_code: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
