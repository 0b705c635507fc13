use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ytdl_merge::config;
use ytdl_merge::downloader::tools::{tool_version, ToolType};
use ytdl_merge::downloader::{
    Downloader, PromptResolution, RunReport, UrlKind, YtDlpExtractor,
};
use ytdl_merge::URL_PROMPT;

#[derive(Debug, Parser)]
#[command(name = "ytdl-merge", version, about = "Download a video or playlist and merge its best streams")]
struct Cli {
    /// Video or playlist URL; asked for interactively when omitted.
    url: Option<String>,

    /// Resolution label such as 1080p; a numbered list is shown when omitted.
    #[arg(long)]
    quality: Option<String>,

    /// Directory for downloaded and merged files.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log external commands and tool versions.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_level(true)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = config::load(cli.config.as_deref()).context("load config")?;
    cfg.apply_env(|key| std::env::var(key).ok());
    if let Some(dir) = cli.output_dir {
        cfg.output_dir = dir;
    }

    let extractor_cfg = cfg.extractor_config();
    let muxer = cfg.muxer();
    if cli.verbose {
        tracing::debug!(
            "yt-dlp: {} ({})",
            extractor_cfg.ytdlp_path,
            tool_version(ToolType::YtDlp, &extractor_cfg.ytdlp_path).unwrap_or_else(|| "not runnable".to_string())
        );
    }

    let downloader = Downloader::new(
        Box::new(YtDlpExtractor::new(extractor_cfg)),
        Box::new(muxer),
    )
    .with_output_dir(cfg.output_dir.clone());

    println!("YouTube Downloader");
    let url = match cli.url {
        Some(url) => url,
        None => read_url().context("read URL")?,
    };

    let mut provider = PromptResolution::stdio();
    let kind = UrlKind::detect(&url);

    match downloader.run(&url, cli.quality, &mut provider).await {
        Ok(RunReport::Video(outcome)) => {
            tracing::debug!("Saved {}", outcome.output_path.display());
        }
        Ok(RunReport::Playlist(report)) => {
            tracing::info!(
                "Playlist {} finished: {} downloaded, {} failed",
                report.title,
                report.succeeded(),
                report.failed()
            );
        }
        Err(e) => {
            let what = match kind {
                UrlKind::Playlist => "playlist",
                UrlKind::Video => "video",
            };
            tracing::error!("Error downloading {}: {}", what, e);
            if let Some(reason) = e.blocking_reason() {
                match reason.hint() {
                    Some(hint) => tracing::error!("{}. {}", reason.description(), hint),
                    None => tracing::error!("{}", reason.description()),
                }
            }
        }
    }

    Ok(())
}

fn read_url() -> std::io::Result<String> {
    let mut out = std::io::stdout();
    write!(out, "{}", URL_PROMPT)?;
    out.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
