// src/convert.rs

//! External document and image converters
//!
//! The pipeline treats the LaTeX→HTML converter and the vector→raster image
//! converter as black-box file transformers behind the narrow [`Converter`]
//! capability, so tests can substitute fakes without spawning real
//! binaries. Invocations run with stdin nullified and a hang timeout; a
//! nonzero exit or timeout surfaces as [`Error::Converter`] and the call
//! sites degrade to an empty conversion result instead of unwinding the
//! problem.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Hang guard for external converter invocations
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A file-to-file format converter
pub trait Converter {
    /// Convert `input` into `output`
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

/// A converter backed by an external command
///
/// The argument template is expanded per call: `{input}` and `{output}`
/// tokens are replaced with the respective paths.
pub struct CommandConverter {
    program: PathBuf,
    arg_template: Vec<String>,
    timeout: Duration,
}

impl CommandConverter {
    pub fn new(program: PathBuf, arg_template: Vec<String>) -> Self {
        Self {
            program,
            arg_template,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The LaTeX→HTML converter (pandoc)
    pub fn pandoc() -> Result<Self> {
        let program = which::which("pandoc")
            .map_err(|e| Error::Converter(format!("pandoc not found: {e}")))?;
        Ok(Self::new(
            program,
            vec!["{input}".into(), "-o".into(), "{output}".into()],
        ))
    }

    /// The vector→raster image converter (ImageMagick)
    pub fn imagemagick() -> Result<Self> {
        let program = which::which("convert")
            .map_err(|e| Error::Converter(format!("ImageMagick convert not found: {e}")))?;
        Ok(Self::new(program, vec!["{input}".into(), "{output}".into()]))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Placeholder for a converter binary that is not installed
///
/// Every call fails with the recorded reason, which the statement and
/// asset call sites downgrade to a warning plus empty output. Imports on
/// hosts without pandoc or ImageMagick still run; only the affected
/// fragments degrade.
pub struct UnavailableConverter {
    reason: String,
}

impl UnavailableConverter {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Converter for UnavailableConverter {
    fn convert(&self, _input: &Path, _output: &Path) -> Result<()> {
        Err(Error::Converter(self.reason.clone()))
    }
}

impl Converter for CommandConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let args: Vec<String> = self
            .arg_template
            .iter()
            .map(|a| {
                a.replace("{input}", &input.to_string_lossy())
                    .replace("{output}", &output.to_string_lossy())
            })
            .collect();

        debug!(program = %self.program.display(), ?args, "running converter");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::Converter(format!("failed to spawn {}: {e}", self.program.display()))
            })?;

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let output_data = child.wait_with_output()?;
                let stderr = String::from_utf8_lossy(&output_data.stderr);
                if !stderr.is_empty() {
                    for line in stderr.lines() {
                        warn!("[{}] {}", self.program.display(), line);
                    }
                }
                if status.success() {
                    Ok(())
                } else {
                    Err(Error::Converter(format!(
                        "{} exited with code {}",
                        self.program.display(),
                        status.code().unwrap_or(-1)
                    )))
                }
            }
            None => {
                let _ = child.kill();
                Err(Error::Converter(format!(
                    "{} timed out after {} seconds",
                    self.program.display(),
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn runs_a_real_command() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "payload").unwrap();

        // cp is a converter as far as the capability is concerned
        let converter = CommandConverter::new(
            PathBuf::from("/bin/cp"),
            vec!["{input}".into(), "{output}".into()],
        );
        converter.convert(&input, &output).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "payload");
    }

    #[test]
    fn nonzero_exit_is_a_converter_error() {
        let dir = TempDir::new().unwrap();
        let converter = CommandConverter::new(
            PathBuf::from("/bin/cp"),
            vec!["{input}".into(), "{output}".into()],
        );
        let err = converter
            .convert(&dir.path().join("absent"), &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, Error::Converter(_)));
    }

    #[test]
    fn timeout_kills_the_child() {
        let converter = CommandConverter::new(
            PathBuf::from("/bin/sleep"),
            vec!["5".into()],
        )
        .with_timeout(Duration::from_millis(50));
        let err = converter
            .convert(Path::new("unused"), Path::new("unused"))
            .unwrap_err();
        assert!(matches!(err, Error::Converter(_)));
    }
}
