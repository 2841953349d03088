use std::io::{self, Write};

use serde::Serialize;

use crate::catalog::QueryListing;
use crate::pipeline::{HarvestReport, PlannedQuery, ProgressEvent, ProgressSink};
use crate::relabel::RelabelReport;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_harvest(result: &HarvestReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_plan(result: &[PlannedQuery]) -> io::Result<()> {
        Self::print_json(&result)
    }

    pub fn print_queries(result: &[QueryListing]) -> io::Result<()> {
        Self::print_json(&result)
    }

    pub fn print_relabel(result: &RelabelReport) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Progress lines on stderr, stdout stays free for the summary.
pub struct ConsoleOutput;

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("  {} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("  {}", event.message),
        }
    }
}
