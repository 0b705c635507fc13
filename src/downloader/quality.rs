// Quality selection
//
// Turns a set of video streams into a numbered list of (resolution, size)
// options and maps the user's pick back to a resolution label. The label,
// not the stream, is what the orchestrator matches on afterwards.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use super::errors::DownloadError;
use super::models::{resolution_value, QualityOption, StreamDescriptor};

pub const QUALITY_PROMPT: &str = "Enter the number of the desired quality: ";

/// Distinct (resolution, size) pairs, highest resolution first.
///
/// Streams without a resolution are not offerable. Two encodings with the
/// same resolution but different sizes are both kept. Ties keep discovery order.
pub fn available_qualities<'a>(
    streams: impl IntoIterator<Item = &'a StreamDescriptor>,
) -> Vec<QualityOption> {
    let mut seen = HashSet::new();
    let mut options: Vec<QualityOption> = streams
        .into_iter()
        .filter_map(|s| match s.resolution.as_deref() {
            Some(res) if !res.trim().is_empty() => Some(QualityOption::new(res, s.filesize)),
            _ => None,
        })
        .filter(|opt| seen.insert(opt.clone()))
        .collect();

    options.sort_by_key(|opt| std::cmp::Reverse(resolution_value(&opt.resolution).unwrap_or(0)));
    options
}

/// Numbered list, one option per line
pub fn render_options(options: &[QualityOption]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(idx, opt)| format!("{}. {} ({:.2} MB)\n", idx + 1, opt.resolution, opt.size_mib()))
        .collect()
}

/// Map a 1-based selection back to its resolution label
pub fn select(options: &[QualityOption], input: &str) -> Result<String, DownloadError> {
    if options.is_empty() {
        return Err(DownloadError::NoQualityOptions);
    }

    let invalid = || DownloadError::InvalidSelection {
        input: input.trim().to_string(),
        max: options.len(),
    };

    let choice: usize = input.trim().parse().map_err(|_| invalid())?;
    if choice == 0 {
        return Err(invalid());
    }
    options
        .get(choice - 1)
        .map(|opt| opt.resolution.clone())
        .ok_or_else(invalid)
}

/// Supplies a resolution label given the available options
pub trait ResolutionProvider {
    fn choose(&mut self, options: &[QualityOption]) -> Result<String, DownloadError>;
}

/// Always answers with the same label, without looking at the options
#[derive(Debug, Clone)]
pub struct FixedResolution(pub String);

impl ResolutionProvider for FixedResolution {
    fn choose(&mut self, _options: &[QualityOption]) -> Result<String, DownloadError> {
        Ok(self.0.clone())
    }
}

/// Prints the options and reads one line of input. No retry on bad input.
pub struct PromptResolution<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResolution<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptResolution<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ResolutionProvider for PromptResolution<R, W> {
    fn choose(&mut self, options: &[QualityOption]) -> Result<String, DownloadError> {
        if options.is_empty() {
            return Err(DownloadError::NoQualityOptions);
        }

        write!(
            self.output,
            "\nAvailable qualities:\n{}{}",
            render_options(options),
            QUALITY_PROMPT
        )?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        select(options, &line)
    }
}
