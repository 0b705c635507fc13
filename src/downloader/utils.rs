// Helper functions shared by the extractor and the muxer

use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};

use super::errors::DownloadError;

/// Run command with timeout, capturing stdout and stderr
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    tracing::debug!("Running: {} {}", program, args.join(" "));

    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| DownloadError::Parse(format!("Failed to capture stdout from {}", program)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| DownloadError::Parse(format!("Failed to capture stderr from {}", program)))?;

    // Both pipes are drained while waiting so a chatty child cannot block on a full pipe
    let collect = async {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let (out, err, status) = tokio::join!(
            stdout_pipe.read_to_end(&mut stdout),
            stderr_pipe.read_to_end(&mut stderr),
            child.wait(),
        );
        out?;
        err?;
        let status = status?;
        Ok::<_, std::io::Error>(std::process::Output { status, stdout, stderr })
    };

    match timeout(TokioDuration::from_secs(timeout_secs), collect).await {
        Ok(output) => Ok(output?),
        Err(_) => Err(DownloadError::Timeout {
            program: program.to_string(),
            secs: timeout_secs,
        }),
    }
}

/// Map a spawn failure, distinguishing a missing binary
pub fn spawn_error(program: &str, e: std::io::Error) -> DownloadError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DownloadError::ToolNotFound(program.to_string())
    } else {
        DownloadError::Io(e)
    }
}

/// Make a video title usable as a file name; `None` if nothing usable is left
pub fn sanitize_filename(title: &str) -> Option<String> {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
