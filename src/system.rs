//! Running external programs.

use crate::error::CasicsError;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run `args[0]` with the remaining arguments and collect its output.
///
/// `env` entries are added on top of the inherited environment. The child
/// runs in its own process group and is killed if `max_time` elapses.
pub async fn shell_cmd<S: AsRef<OsStr>>(
    args: &[S],
    max_time: Duration,
    env: Option<&HashMap<String, String>>,
) -> Result<CommandOutput, CasicsError> {
    let (program, rest) = args.split_first().ok_or_else(|| CasicsError::ShellCommand {
        program: String::new(),
        message: "empty command line".to_string(),
    })?;
    let program_name = program.as_ref().to_string_lossy().into_owned();

    let mut cmd = Command::new(program);
    cmd.args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(env) = env {
        cmd.envs(env);
    }
    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd.spawn().map_err(|e| CasicsError::ShellCommand {
        program: program_name.clone(),
        message: e.to_string(),
    })?;

    let pid = child.id();
    debug!(program = %program_name, ?pid, "spawned child process");
    let output = match tokio::time::timeout(max_time, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            if let Some(pid) = pid {
                kill_group(pid);
            }
            warn!(program = %program_name, ?max_time, "command timed out; killed");
            return Err(CasicsError::Timeout(max_time));
        }
    };

    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// SIGKILL every process in the group led by `pid`, so that grandchildren
/// started by the command die with it.
#[cfg(unix)]
fn kill_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg takes plain integers and touches no memory.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, error = %err, "failed to kill process group");
        }
    }
}

// Without process groups only the direct child is killed, on drop.
#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

/// Run a shell command that writes its result to a temporary file and return
/// that file's text.
///
/// In `template`, `{0}` is replaced by the temporary output file and `{1}` by
/// `file`. A non-zero exit yields an empty string. The temporary file is
/// always removed.
pub async fn run_with_output_file(
    template: &str,
    file: impl AsRef<Path>,
    max_time: Duration,
) -> Result<String, CasicsError> {
    let file = file.as_ref();
    let mut out_name = std::env::current_dir()?.join(file).into_os_string();
    out_name.push(".__tmp__");
    let out_file = std::path::PathBuf::from(out_name);

    let cmd_line = template
        .replace("{0}", &out_file.to_string_lossy())
        .replace("{1}", &file.to_string_lossy());

    let result = run_and_read(&cmd_line, &out_file, max_time).await;

    if let Err(e) = tokio::fs::remove_file(&out_file).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %out_file.display(), error = %e, "failed to remove temporary file");
    }
    result
}

async fn run_and_read(
    cmd_line: &str,
    out_file: &Path,
    max_time: Duration,
) -> Result<String, CasicsError> {
    let output = shell_cmd(&["sh", "-c", cmd_line], max_time, None).await?;
    if output.success() {
        Ok(tokio::fs::read_to_string(out_file).await?)
    } else {
        warn!("*** command \"{}\" returned {:?}", cmd_line, output.code);
        Ok(String::new())
    }
}

/// Description of a file's type, as reported by `file --brief`.
pub async fn file_magic(path: impl AsRef<Path>) -> Result<String, CasicsError> {
    let path = path.as_ref();
    let mut cmd = Command::new("file");
    cmd.arg("--brief").arg(path).stdin(Stdio::null());
    let output = cmd.output().await.map_err(|e| CasicsError::ShellCommand {
        program: "file".to_string(),
        message: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(CasicsError::ShellCommand {
            program: "file".to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(decode_text(&output.stdout).trim_end().to_string())
}

/// UTF-8 when valid, else ISO-8859-1.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Fail with `Timeout` if `fut` does not finish within `duration`.
pub async fn with_timeout<F, T>(duration: Duration, fut: F) -> Result<T, CasicsError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| CasicsError::Timeout(duration))
}
