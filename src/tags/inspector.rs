//! Listing the release tags of the watched checkout.
//!
//! Tags are read with `git -C <path> --no-pager tag` on every call; nothing is
//! cached. Any failure of the subprocess (spawn error, timeout, non-zero exit,
//! or anything written to stderr) is logged and degrades to an empty list, so
//! a broken checkout never fails the webhook request.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::version::TagVersion;

/// Errors from running the tag listing subprocess.
#[derive(Debug, Error)]
pub enum TagInspectionError {
    /// The process could not be started (e.g. `git` not installed).
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process did not finish within the allotted time.
    #[error("{command} did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    /// The process exited unsuccessfully without explaining why.
    #[error("{command} exited with {status}")]
    ExitStatus {
        command: String,
        status: std::process::ExitStatus,
    },
}

/// Something that can report the local tags, sorted oldest to newest.
///
/// The webhook handler only depends on this trait, so tests can substitute a
/// double that records whether it was consulted.
pub trait TagSource {
    /// Returns the canonical tag names in ascending version order.
    fn sorted_tags(&self) -> impl Future<Output = Vec<String>> + Send;
}

/// Reads tags from a local git checkout.
#[derive(Debug, Clone)]
pub struct GitTagInspector {
    repo_path: PathBuf,
    timeout: Duration,
}

impl GitTagInspector {
    pub fn new(repo_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        GitTagInspector {
            repo_path: repo_path.into(),
            timeout,
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

impl TagSource for GitTagInspector {
    fn sorted_tags(&self) -> impl Future<Output = Vec<String>> + Send {
        list_sorted_tags(&self.repo_path, self.timeout)
    }
}

/// Lists the tags of the repository at `path`, sorted by version.
///
/// Never fails: problems are logged and yield an empty list.
pub async fn list_sorted_tags(path: &Path, timeout: Duration) -> Vec<String> {
    let abs_path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    info!(path = %abs_path.display(), "checking local tags");

    let mut cmd = tag_command(&abs_path);
    let command = format!("git -C {} --no-pager tag", abs_path.display());

    match capture_output(&mut cmd, &command, timeout).await {
        Ok(output) if output.stderr.is_empty() && !output.status.success() => {
            let e = TagInspectionError::ExitStatus {
                command,
                status: output.status,
            };
            error!(error = %e, "tag listing failed");
            Vec::new()
        }
        Ok(output) => sorted_tags_from_output(&output.stdout, &output.stderr),
        Err(e) => {
            error!(error = %e, "tag listing failed");
            Vec::new()
        }
    }
}

/// Parses and sorts the output of `git tag`.
///
/// If `stderr` is non-empty the whole listing is discarded. Otherwise each
/// non-blank line is parsed as a [`TagVersion`]; lines that do not parse are
/// logged and skipped. The result is rendered in canonical form.
pub fn sorted_tags_from_output(stdout: &[u8], stderr: &[u8]) -> Vec<String> {
    if !stderr.is_empty() {
        error!(
            stderr = %String::from_utf8_lossy(stderr).trim(),
            "git reported an error while listing tags"
        );
        return Vec::new();
    }

    let stdout = String::from_utf8_lossy(stdout);
    let mut versions: Vec<TagVersion> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.parse::<TagVersion>() {
            Ok(version) => Some(version),
            Err(e) => {
                warn!(tag = line, error = %e, "cannot parse tag as a version");
                None
            }
        })
        .collect();
    versions.sort();

    let tags: Vec<String> = versions.iter().map(ToString::to_string).collect();
    let recent = &tags[tags.len().saturating_sub(10)..];
    debug!(count = tags.len(), ?recent, "sorted local tags");
    tags
}

/// Builds the `git tag` command for a checkout.
fn tag_command(repo_path: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo_path).args(["--no-pager", "tag"]);

    // Never block on a credential or pager prompt
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd
}

/// Runs `cmd` to completion, capturing both streams, bounded by `timeout`.
///
/// The child is killed if the timeout expires.
async fn capture_output(
    cmd: &mut Command,
    command: &str,
    timeout: Duration,
) -> Result<Output, TagInspectionError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| TagInspectionError::Spawn {
        command: command.to_string(),
        source,
    })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(TagInspectionError::Spawn {
            command: command.to_string(),
            source,
        }),
        Err(_) => Err(TagInspectionError::TimedOut {
            command: command.to_string(),
            timeout,
        }),
    }
}
