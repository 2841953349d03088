use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::domain::{ImageExtension, ImageVariant, ItemId, Query, Slug, image_file_name};
use crate::error::HarvestError;
use crate::fs_util;
use crate::image::ImageClient;
use crate::pixabay::{SearchClient, SearchFilters, SearchRequest};

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            elapsed: None,
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub item_delay: Duration,
    pub query_delay: Duration,
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            item_delay: Duration::ZERO,
            query_delay: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(500),
            query_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub file_prefix: String,
    pub filters: SearchFilters,
    pub pacing: Pacing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Got every requested image.
    Complete,
    /// Fell short while more matches exist beyond the single page fetched.
    Truncated,
    /// Fell short because the API had nothing more to offer.
    Insufficient,
    NoResults,
    SearchFailed { message: String },
}

impl QueryOutcome {
    /// A short query is `Truncated` only when the page came back full and `total_hits`
    /// exceeds what that page held. Failed items on a full, final page give
    /// `Insufficient`.
    pub fn classify(
        requested: usize,
        downloaded: usize,
        per_page: usize,
        returned_hits: usize,
        total_hits: u64,
    ) -> Self {
        if downloaded >= requested {
            QueryOutcome::Complete
        } else if returned_hits >= per_page && total_hits > returned_hits as u64 {
            QueryOutcome::Truncated
        } else {
            QueryOutcome::Insufficient
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryOutcome::Complete => "complete",
            QueryOutcome::Truncated => "truncated",
            QueryOutcome::Insufficient => "insufficient",
            QueryOutcome::NoResults => "no_results",
            QueryOutcome::SearchFailed { .. } => "search_failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub slug: String,
    pub directory: String,
    pub fallback_directory: bool,
    pub requested: usize,
    pub per_page: usize,
    pub returned_hits: usize,
    pub total_hits: u64,
    pub downloaded: usize,
    pub failed: usize,
    pub skipped_without_url: usize,
    pub files: Vec<String>,
    pub outcome: QueryOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub output_root: String,
    pub per_query_limit: usize,
    pub queries: Vec<QueryReport>,
    pub total_downloaded: usize,
    pub finished_at: String,
}

impl HarvestReport {
    pub fn total_requested(&self) -> usize {
        self.per_query_limit * self.queries.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedQuery {
    pub query: String,
    pub slug: String,
    pub directory: String,
    pub per_page: usize,
}

/// What `run` would do, computed without touching the network or the filesystem.
pub fn plan(
    queries: &[Query],
    per_query_limit: usize,
    output_root: &Utf8Path,
    filters: &SearchFilters,
) -> Vec<PlannedQuery> {
    queries
        .iter()
        .enumerate()
        .map(|(position, query)| {
            let slug = query.slug(position);
            let request = SearchRequest::first_page(query, per_query_limit, filters);
            PlannedQuery {
                query: query.to_string(),
                directory: output_root.join(slug.as_str()).to_string(),
                slug: slug.to_string(),
                per_page: request.per_page,
            }
        })
        .collect()
}

pub struct Harvester<S: SearchClient, I: ImageClient> {
    search: S,
    images: I,
    settings: HarvestSettings,
}

impl<S: SearchClient, I: ImageClient> Harvester<S, I> {
    pub fn new(search: S, images: I, settings: HarvestSettings) -> Self {
        Self {
            search,
            images,
            settings,
        }
    }

    pub fn search_client(&self) -> &S {
        &self.search
    }

    pub fn image_client(&self) -> &I {
        &self.images
    }

    /// Fetches up to `per_query_limit` images for every query, in order.
    ///
    /// Only an uncreatable `output_root` is an error; search, probe, transfer and
    /// per-query directory failures are logged and tallied in the report.
    pub fn run(
        &self,
        queries: &[Query],
        per_query_limit: usize,
        output_root: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<HarvestReport, HarvestError> {
        fs_util::ensure_dir(output_root)?;

        let mut reports = Vec::with_capacity(queries.len());
        for (position, query) in queries.iter().enumerate() {
            if position > 0 {
                pause(self.settings.pacing.query_delay);
            }
            sink.event(ProgressEvent::new(format!(
                "phase=Query; [{}/{}] {query}",
                position + 1,
                queries.len()
            )));
            let report = self.harvest_query(position, query, per_query_limit, output_root, sink);
            tracing::info!(
                "{query}: {}/{} images ({})",
                report.downloaded,
                per_query_limit,
                report.outcome.label()
            );
            reports.push(report);
        }

        let total_downloaded = reports.iter().map(|report| report.downloaded).sum();
        Ok(HarvestReport {
            output_root: output_root.to_string(),
            per_query_limit,
            queries: reports,
            total_downloaded,
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn harvest_query(
        &self,
        position: usize,
        query: &Query,
        limit: usize,
        output_root: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> QueryReport {
        let slug = query.slug(position);
        let (directory, fallback_directory) = self.prepare_directory(output_root, &slug, sink);
        let request = SearchRequest::first_page(query, limit, &self.settings.filters);

        let mut report = QueryReport {
            query: query.to_string(),
            slug: slug.to_string(),
            directory: directory.to_string(),
            fallback_directory,
            requested: limit,
            per_page: request.per_page,
            returned_hits: 0,
            total_hits: 0,
            downloaded: 0,
            failed: 0,
            skipped_without_url: 0,
            files: Vec::new(),
            outcome: QueryOutcome::NoResults,
        };

        sink.event(ProgressEvent::new(format!(
            "search.request per_page={}",
            request.per_page
        )));
        let start = Instant::now();
        let response = match self.search.search(&request) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("search for {query:?} failed: {err}");
                sink.event(ProgressEvent::new(format!("search failed: {err}")));
                report.outcome = QueryOutcome::SearchFailed {
                    message: err.to_string(),
                };
                return report;
            }
        };
        sink.event(ProgressEvent {
            message: format!(
                "search.response hits={} total_hits={}",
                response.hits.len(),
                response.total_hits
            ),
            elapsed: Some(start.elapsed()),
        });

        report.returned_hits = response.hits.len();
        report.total_hits = response.total_hits;
        if response.hits.is_empty() {
            sink.event(ProgressEvent::new(format!("no results for {query}")));
            return report;
        }

        for (index, hit) in response.hits.iter().enumerate() {
            if report.downloaded >= limit {
                break;
            }
            let Some((variant, url)) = ImageVariant::select(hit) else {
                report.skipped_without_url += 1;
                tracing::debug!("hit #{} of {query:?} has no image URL", index + 1);
                sink.event(ProgressEvent::new(format!(
                    "skip: hit #{} has no image URL",
                    index + 1
                )));
                continue;
            };

            let item = ItemId::for_hit(hit, index);
            let sequence = report.downloaded + 1;
            let start = Instant::now();
            match self.materialize(url, item, sequence, &directory) {
                Ok(file_name) => {
                    report.downloaded += 1;
                    sink.event(ProgressEvent {
                        message: format!("saved {file_name} ({variant})"),
                        elapsed: Some(start.elapsed()),
                    });
                    report.files.push(file_name);
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!("download of {url} failed: {err}");
                    sink.event(ProgressEvent::new(format!("failed {url}: {err}")));
                }
            }
            pause(self.settings.pacing.item_delay);
        }

        report.outcome = QueryOutcome::classify(
            limit,
            report.downloaded,
            report.per_page,
            report.returned_hits,
            report.total_hits,
        );
        if report.outcome != QueryOutcome::Complete {
            sink.event(ProgressEvent::new(format!(
                "only {} of {limit} images obtained ({})",
                report.downloaded,
                report.outcome.label()
            )));
        }
        report
    }

    fn prepare_directory(
        &self,
        output_root: &Utf8Path,
        slug: &Slug,
        sink: &dyn ProgressSink,
    ) -> (Utf8PathBuf, bool) {
        let directory = output_root.join(slug.as_str());
        match fs_util::ensure_dir(&directory) {
            Ok(()) => (directory, false),
            Err(err) => {
                tracing::warn!("{err}; saving into {output_root} instead");
                sink.event(ProgressEvent::new(format!(
                    "cannot create {directory}, using {output_root}"
                )));
                (output_root.to_path_buf(), true)
            }
        }
    }

    fn materialize(
        &self,
        url: &str,
        item: ItemId,
        sequence: usize,
        directory: &Utf8Path,
    ) -> Result<String, HarvestError> {
        let probe = self.images.probe(url)?;
        let extension = ImageExtension::resolve(probe.content_type.as_deref(), url);
        let file_name = image_file_name(&self.settings.file_prefix, item, sequence, extension);
        let (path, bytes) =
            fs_util::persist_atomic(directory, &file_name, |out| self.images.download(url, out))?;
        tracing::debug!("wrote {path} ({bytes} bytes)");
        Ok(file_name)
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
