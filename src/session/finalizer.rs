use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::{info, instrument};

use crate::{
    events::{Event, EventStore},
    utils::{
        clock::Clock,
        time::{event_time, file_time},
    },
};

pub const ANALYSIS_BASE_URL: &str = "https://aistudio.google.com/app/prompts/new";

/// Instruction sent ahead of the raw log. The log is appended verbatim after the last line.
pub const ANALYSIS_PROMPT: &str = "Please analyze this Pomodoro work session log and create a concise work journal entry.

Based on the captured keystrokes, clipboard activities, and window changes, please:

1. Identify the main work focus/project
2. Summarize key activities and progress made
3. Note any tools, websites, or applications used
4. Highlight any interesting patterns or insights

Format your response as a Markdown file with:
- H1 title describing the work session
- 3-bullet summary of main activities
- <details> section containing the raw log for reference

Raw log data:
";

pub fn format_event(event: &Event) -> String {
    format!(
        "[{}] :: {} :: {}",
        event_time(&event.timestamp),
        event.kind,
        event.payload
    )
}

/// One line per event, in store order, without a trailing newline.
pub fn format_events(events: &[Event]) -> String {
    events
        .iter()
        .map(format_event)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn log_file_name(time: &DateTime<Local>) -> String {
    format!("raw_log_{}.txt", file_time(time))
}

/// Writes `text` into `dir`, creating the directory first if needed.
#[instrument(skip(text))]
pub async fn write_log(dir: &Path, time: &DateTime<Local>, text: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {dir:?}"))?;
    let path = dir.join(log_file_name(time));
    tokio::fs::write(&path, text)
        .await
        .with_context(|| format!("Failed to write session log {path:?}"))?;
    Ok(path)
}

/// Pre-filled analysis link. Long logs produce URLs that browsers may refuse, which is left to
/// the consumer.
pub fn build_analysis_url(log: &str) -> String {
    let prompt = format!("{ANALYSIS_PROMPT}{log}");
    let encoded = url::form_urlencoded::byte_serialize(prompt.as_bytes()).collect::<String>();
    format!("{ANALYSIS_BASE_URL}?q={encoded}")
}

#[derive(Debug, Clone)]
pub struct FinalizedLog {
    pub path: PathBuf,
    pub analysis_url: String,
    pub event_count: usize,
}

/// Renders an [EventStore] to disk and to an analysis link.
pub struct Finalizer {
    output_directory: PathBuf,
    time_provider: Arc<dyn Clock>,
}

impl Finalizer {
    pub fn new(output_directory: PathBuf, time_provider: Arc<dyn Clock>) -> Self {
        Self {
            output_directory,
            time_provider,
        }
    }

    pub async fn finalize(&self, store: &EventStore) -> Result<FinalizedLog> {
        let events = store.snapshot();
        let text = format_events(&events);
        let path = write_log(&self.output_directory, &self.time_provider.time(), &text).await?;
        info!("Saved {} events to {path:?}", events.len());
        let analysis_url = build_analysis_url(&text);
        Ok(FinalizedLog {
            path,
            analysis_url,
            event_count: events.len(),
        })
    }
}
