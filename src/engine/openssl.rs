use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use super::{CaRequest, CryptoEngine, CsrRequest, SignRequest};
use crate::error::{CertBundleError, Result};
use crate::fs_util;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Engine that runs the `openssl` command line tool.
///
/// Every command line is logged before it runs and the tool's stdout and
/// stderr are passed straight through. Outputs go to staged paths that are
/// renamed into place only after the tool exits successfully.
#[derive(Debug, Clone)]
pub struct OpensslCli {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for OpensslCli {
    fn default() -> Self {
        OpensslCli::new("openssl")
    }
}

impl OpensslCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        OpensslCli {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill the tool and fail if a single invocation runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn command_line(&self, args: &[OsString]) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run(&self, args: Vec<OsString>) -> Result<()> {
        let command_line = self.command_line(&args);
        info!("{command_line}");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| CertBundleError::io(&self.program, e))?;

        let status = match self.timeout {
            Some(timeout) => wait_with_timeout(&mut child, timeout)
                .map_err(|e| CertBundleError::io(&self.program, e))?
                .ok_or_else(|| CertBundleError::CommandTimedOut {
                    command: command_line.clone(),
                    timeout,
                })?,
            None => child
                .wait()
                .map_err(|e| CertBundleError::io(&self.program, e))?,
        };

        if !status.success() {
            return Err(CertBundleError::CommandFailed {
                command: command_line,
                status,
            });
        }
        Ok(())
    }
}

/// Waits for `child`, killing it once `timeout` has passed. `None` means it was killed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn arg(value: impl Into<OsString>) -> OsString {
    value.into()
}

fn path_arg(path: &Path) -> OsString {
    path.as_os_str().to_os_string()
}

impl CryptoEngine for OpensslCli {
    fn self_signed_ca(&self, request: &CaRequest<'_>) -> Result<()> {
        let key_staged = fs_util::staging_path(request.key_out)?;
        let cert_staged = fs_util::staging_path(request.cert_out)?;

        self.run(vec![
            arg("req"),
            arg("-x509"),
            arg("-newkey"),
            arg(format!("rsa:{}", request.key_bits)),
            arg("-keyout"),
            path_arg(&key_staged),
            arg("-out"),
            path_arg(&cert_staged),
            arg("-days"),
            arg(request.days.to_string()),
            arg("-nodes"),
            arg("-subj"),
            arg(request.subject.to_openssl_subject()),
        ])?;

        fs_util::commit(&key_staged, request.key_out)?;
        fs_util::commit(&cert_staged, request.cert_out)
    }

    fn key_and_csr(&self, request: &CsrRequest<'_>) -> Result<()> {
        let key_staged = fs_util::staging_path(request.key_out)?;
        let csr_staged = fs_util::staging_path(request.csr_out)?;

        self.run(vec![
            arg("req"),
            arg("-out"),
            path_arg(&csr_staged),
            arg("-new"),
            arg("-newkey"),
            arg(format!("rsa:{}", request.key_bits)),
            arg("-nodes"),
            arg("-keyout"),
            path_arg(&key_staged),
            arg("-subj"),
            arg(request.subject.to_openssl_subject()),
        ])?;

        fs_util::commit(&key_staged, request.key_out)?;
        fs_util::commit(&csr_staged, request.csr_out)
    }

    fn sign_csr(&self, request: &SignRequest<'_>) -> Result<()> {
        let cert_staged = fs_util::staging_path(request.cert_out)?;

        self.run(vec![
            arg("x509"),
            arg("-req"),
            arg("-days"),
            arg(request.days.to_string()),
            arg("-in"),
            path_arg(request.csr),
            arg("-CA"),
            path_arg(request.ca_cert),
            arg("-CAkey"),
            path_arg(request.ca_key),
            arg("-CAserial"),
            path_arg(request.serial),
            arg("-CAcreateserial"),
            arg("-out"),
            path_arg(&cert_staged),
        ])?;

        fs_util::commit(&cert_staged, request.cert_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_is_space_joined() {
        let engine = OpensslCli::new("/usr/bin/openssl");
        let line = engine.command_line(&[arg("req"), arg("-subj"), arg("/CN=svc1.ns1.svc")]);
        assert_eq!(line, "/usr/bin/openssl req -subj /CN=svc1.ns1.svc");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_tool_reports_command() {
        let engine = OpensslCli::new("false");
        let err = engine.run(vec![arg("req")]).unwrap_err();
        match err {
            CertBundleError::CommandFailed { command, status } => {
                assert_eq!(command, "false req");
                assert!(!status.success());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_tool_is_an_io_error() {
        let engine = OpensslCli::new("/nonexistent/openssl-binary");
        let err = engine.run(vec![arg("version")]).unwrap_err();
        assert!(matches!(err, CertBundleError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_tool_is_killed() {
        let engine = OpensslCli::new("sleep").with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let err = engine.run(vec![arg("5")]).unwrap_err();
        assert!(matches!(err, CertBundleError::CommandTimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
