// Newline-delimited JSON ingest
//
// Reads one LogEvent per line and hands them to the sink in batches of at
// most `max_events`. Batches are flushed one at a time, in input order.

use anyhow::{Context, Result};
use logs2influx_core::LogEvent;
use logs2influx_sink::BatchSink;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Counters reported once the input is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub events: usize,
    pub batches: usize,
    pub skipped_lines: usize,
}

/// Drain `reader` into `sink`.
///
/// Blank lines are ignored; lines that do not decode as a log event are
/// skipped with a warning. A sink error aborts the run.
pub async fn ingest<R, S>(reader: R, sink: &S, max_events: usize) -> Result<IngestStats>
where
    R: AsyncBufRead + Unpin,
    S: BatchSink + ?Sized,
{
    let max_events = max_events.max(1);
    let mut stats = IngestStats::default();
    let mut pending: Vec<LogEvent> = Vec::with_capacity(max_events);
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LogEvent>(&line) {
            Ok(event) => pending.push(event),
            Err(e) => {
                stats.skipped_lines += 1;
                warn!(line = line_no, error = %e, "Skipping malformed log event");
                continue;
            }
        }

        if pending.len() >= max_events {
            flush(sink, &mut pending, &mut stats).await?;
        }
    }

    if pending.is_empty() {
        sink.emit_empty_batch().await?;
    } else {
        flush(sink, &mut pending, &mut stats).await?;
    }

    info!(
        events = stats.events,
        batches = stats.batches,
        skipped = stats.skipped_lines,
        "Input exhausted"
    );
    Ok(stats)
}

async fn flush<S: BatchSink + ?Sized>(
    sink: &S,
    pending: &mut Vec<LogEvent>,
    stats: &mut IngestStats,
) -> Result<()> {
    debug!(events = pending.len(), "Flushing batch");
    sink.emit_batch(pending).await?;
    stats.events += pending.len();
    stats.batches += 1;
    pending.clear();
    Ok(())
}
