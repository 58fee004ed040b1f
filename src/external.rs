//! External schema validation through the `claude` CLI.
//!
//! The last validation pass shells out to `claude plugin validate <path>`
//! for the marketplace index and each plugin manifest. The call sits behind
//! the [`ExternalValidator`] trait so tests can substitute a stub and the
//! `--no-external` flag can turn it off.

use crate::config::ExternalConfig;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum ExternalValidationError {
    #[error("'{0}' command not found")]
    NotFound(String),
    #[error("validation failed (exit code {code}):\n{output}")]
    Failed { code: i32, output: String },
    #[error("validation timed out (>{}s)", .0.as_secs())]
    TimedOut(Duration),
    #[error("failed to run validator: {0}")]
    Io(#[from] std::io::Error),
}

/// Validates one marketplace index or plugin manifest.
pub trait ExternalValidator {
    fn validate(&self, path: &Path) -> Result<(), ExternalValidationError>;
}

/// Runs `<program> plugin validate <path>` with a hard timeout.
#[derive(Debug, Clone)]
pub struct ClaudePluginValidator {
    program: String,
    timeout: Duration,
}

impl ClaudePluginValidator {
    pub fn new(program: &str, timeout: Duration) -> Self {
        ClaudePluginValidator {
            program: program.to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &ExternalConfig) -> Self {
        Self::new(&config.program, Duration::from_secs(config.timeout_secs))
    }
}

impl ExternalValidator for ClaudePluginValidator {
    fn validate(&self, path: &Path) -> Result<(), ExternalValidationError> {
        if !which_exists(&self.program) {
            return Err(ExternalValidationError::NotFound(self.program.clone()));
        }

        let start = Instant::now();
        let mut child = Command::new(&self.program)
            .arg("plugin")
            .arg("validate")
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ExternalValidationError::NotFound(self.program.clone())
                }
                _ => ExternalValidationError::Io(e),
            })?;

        // Drain both pipes while the child runs so it never stalls on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let poll_interval = Duration::from_millis(100);
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if start.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExternalValidationError::TimedOut(self.timeout));
                }
                None => std::thread::sleep(poll_interval),
            }
        };

        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;
        tracing::debug!(
            path = %path.display(),
            status = ?status.code(),
            "external validation finished in {}ms",
            start.elapsed().as_millis()
        );
        if status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&stderr);
        if !stderr.trim().is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(stderr.trim());
        }
        Err(ExternalValidationError::Failed {
            code: status.code().unwrap_or(-1),
            output: combined,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        pipe.read_to_end(&mut buffer).map(|_| buffer)
    })
}

fn collect(
    reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
) -> Result<Vec<u8>, ExternalValidationError> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| std::io::Error::other("output reader panicked"))?
            .map_err(ExternalValidationError::Io),
        None => Ok(Vec::new()),
    }
}

/// Returns `true` if an executable named `cmd` exists on `PATH`.
///
/// On Unix the file must also have an executable permission bit set.
pub fn which_exists(cmd: &str) -> bool {
    let cmd_path = Path::new(cmd);
    if cmd_path.components().count() > 1 {
        return cmd_path.is_file();
    }
    std::env::var_os("PATH")
        .map(|path| {
            std::env::split_paths(&path).any(|dir| {
                let candidate = dir.join(cmd);
                if !candidate.is_file() {
                    return false;
                }
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::metadata(&candidate)
                        .map(|m| m.permissions().mode() & 0o111 != 0)
                        .unwrap_or(false)
                }
                #[cfg(not(unix))]
                {
                    true
                }
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_not_found() {
        let validator =
            ClaudePluginValidator::new("cat-toolkit-no-such-binary", Duration::from_secs(1));
        let err = validator.validate(Path::new(".")).unwrap_err();
        assert!(matches!(err, ExternalValidationError::NotFound(_)));
        assert_eq!(err.to_string(), "'cat-toolkit-no-such-binary' command not found");
    }

    #[test]
    fn timeout_message_uses_seconds() {
        let err = ExternalValidationError::TimedOut(Duration::from_secs(30));
        assert_eq!(err.to_string(), "validation timed out (>30s)");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported_with_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-claude");
        std::fs::write(&script, "#!/bin/sh\necho \"bad manifest: $3\"\nexit 3\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let validator =
            ClaudePluginValidator::new(script.to_str().unwrap(), Duration::from_secs(10));
        match validator.validate(Path::new("plugin.json")) {
            Err(ExternalValidationError::Failed { code, output }) => {
                assert_eq!(code, 3);
                assert_eq!(output, "bad manifest: plugin.json");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn large_output_does_not_stall_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-claude");
        std::fs::write(
            &script,
            "#!/bin/sh\nhead -c 200000 /dev/zero | tr '\\0' x\necho\necho broken >&2\nexit 1\n",
        )
        .unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let validator =
            ClaudePluginValidator::new(script.to_str().unwrap(), Duration::from_secs(5));
        match validator.validate(Path::new("plugin.json")) {
            Err(ExternalValidationError::Failed { code, output }) => {
                assert_eq!(code, 1);
                assert!(output.starts_with(&"x".repeat(200_000)));
                assert!(output.ends_with("\nbroken"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
