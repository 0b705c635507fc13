// Locating the external binaries the pipeline shells out to

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn binary_name(&self) -> String {
        if cfg!(target_os = "windows") {
            format!("{}.exe", self.as_str())
        } else {
            self.as_str().to_string()
        }
    }
}

/// Resolve the program to run for `tool`.
///
/// An explicit path wins. Otherwise the usual install locations are probed, then
/// `which`, and finally the bare name is returned so the OS can search PATH.
pub fn find_tool(tool: ToolType, explicit: Option<&str>) -> String {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        return path.to_string();
    }

    let binary_name = tool.binary_name();

    let common_paths = [
        format!("/opt/homebrew/bin/{}", binary_name), // Homebrew on Apple Silicon
        format!("/usr/local/bin/{}", binary_name),
        format!("/usr/bin/{}", binary_name),
    ];

    for path in common_paths {
        if Path::new(&path).exists() {
            return path;
        }
    }

    if let Ok(output) = Command::new("which").arg(&binary_name).output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return path;
            }
        }
    }

    binary_name
}

/// `--version` / `-version` output of a tool, if it runs
pub fn tool_version(tool: ToolType, path: &str) -> Option<String> {
    let arg = match tool {
        ToolType::YtDlp => "--version",
        ToolType::Ffmpeg => "-version",
    };

    match Command::new(path).arg(arg).output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|l| l.trim().to_string()),
        _ => None,
    }
}
