// ── Date-range filtering pipeline ──
//
// Computes per-record visibility and summary statistics for a date
// range. Prefers a worker thread; falls back to inline computation
// with identical output.

mod compute;
mod strategy;

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::CoreError;
use crate::model::{DateRange, Record};

pub use compute::{FilterOutcome, FilterStatistics, VisibilityResult};
pub use strategy::{FilterStrategy, InlineStrategy, StrategyKind, WorkerStrategy};

/// Best-effort progress notification. Not guaranteed to fire for the
/// last chunk before the result is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterProgress {
    pub chunk: usize,
    pub processed: usize,
    pub total: usize,
}

impl FilterProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        u8::try_from(self.processed.min(self.total) * 100 / self.total).unwrap_or(100)
    }
}

pub type ProgressFn = Arc<dyn Fn(FilterProgress) + Send + Sync>;

#[derive(Clone, Default)]
pub struct FilterOptions {
    pub include_statistics: bool,
    pub on_progress: Option<ProgressFn>,
}

impl fmt::Debug for FilterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOptions")
            .field("include_statistics", &self.include_statistics)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Everything a strategy needs to compute one result.
#[derive(Clone, Debug)]
pub struct FilterJob {
    pub records: Arc<Vec<Arc<Record>>>,
    pub range: DateRange,
    pub options: FilterOptions,
    pub chunk_size: usize,
    pub progress_threshold: usize,
}

/// Runs filter jobs through the strategy selected at construction.
pub struct FilterPipeline {
    primary: Box<dyn FilterStrategy>,
    fallback: Box<dyn FilterStrategy>,
    config: PipelineConfig,
}

impl FilterPipeline {
    /// Select the strategy once: the worker when enabled and a runtime is
    /// available, inline otherwise.
    pub fn new(config: PipelineConfig) -> Self {
        let primary: Box<dyn FilterStrategy> = if config.use_worker {
            match WorkerStrategy::from_current(config.worker_timeout) {
                Ok(worker) => Box::new(worker),
                Err(e) => {
                    warn!(error = %e, "filter worker unavailable, filtering inline");
                    Box::new(InlineStrategy)
                }
            }
        } else {
            Box::new(InlineStrategy)
        };
        Self::with_strategies(config, primary, Box::new(InlineStrategy))
    }

    pub fn with_strategies(
        config: PipelineConfig,
        primary: Box<dyn FilterStrategy>,
        fallback: Box<dyn FilterStrategy>,
    ) -> Self {
        debug!(primary = %primary.kind(), fallback = %fallback.kind(), "filter pipeline ready");
        Self {
            primary,
            fallback,
            config,
        }
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.primary.kind()
    }

    /// Compute visibility of `records` for `[start, end]` (both days inclusive).
    ///
    /// A failing worker is retried once inline. When the fallback fails
    /// too, both causes come back as [`CoreError::Pipeline`].
    pub async fn filter_by_date_range(
        &self,
        records: Arc<Vec<Arc<Record>>>,
        start: NaiveDate,
        end: NaiveDate,
        options: FilterOptions,
    ) -> Result<FilterOutcome, CoreError> {
        let job = FilterJob {
            records,
            range: DateRange::new(start, end),
            options,
            chunk_size: self.config.chunk_size,
            progress_threshold: self.config.progress_threshold,
        };

        match self.primary.run(job.clone()).await {
            Ok(outcome) => Ok(outcome),
            Err(e) if self.primary.kind() == StrategyKind::Inline => Err(e),
            Err(e) => {
                warn!(
                    error = %e,
                    range = %job.range,
                    records = job.records.len(),
                    "filter worker failed, retrying inline"
                );
                self.fallback
                    .run(job)
                    .await
                    .map_err(|fallback| CoreError::Pipeline {
                        message: format!("{e}; inline fallback: {fallback}"),
                    })
            }
        }
    }
}

impl fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("primary", &self.primary.kind())
            .field("fallback", &self.fallback.kind())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::future::BoxFuture;
    use pretty_assertions::assert_eq;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn january_records() -> Arc<Vec<Arc<Record>>> {
        let dates = [
            ("a", "2025-01-01"),
            ("b", "2025-01-10T08:00:00Z"),
            ("c", "2025-01-15"),
            ("d", "2025-01-31 23:59:00"),
            ("e", "2025-01-20"),
            ("f", "2024-12-31"),
            ("g", "2025-02-01"),
            ("h", "someday"),
        ];
        Arc::new(
            dates
                .iter()
                .map(|(id, date)| Arc::new(Record::new(*date, *id, "").with_id(*id)))
                .collect(),
        )
    }

    fn stats_options() -> FilterOptions {
        FilterOptions {
            include_statistics: true,
            on_progress: None,
        }
    }

    struct Failing(StrategyKind);

    impl FilterStrategy for Failing {
        fn kind(&self) -> StrategyKind {
            self.0
        }

        fn run(&self, _job: FilterJob) -> BoxFuture<'static, Result<FilterOutcome, CoreError>> {
            Box::pin(async { Err(CoreError::WorkerUnavailable { reason: "test".into() }) })
        }
    }

    #[tokio::test]
    async fn january_scenario_counts_five_of_eight() {
        let pipeline = FilterPipeline::new(PipelineConfig::default());
        let outcome = pipeline
            .filter_by_date_range(january_records(), d(2025, 1, 1), d(2025, 1, 31), stats_options())
            .await
            .unwrap();

        let stats = outcome.statistics.unwrap();
        assert_eq!(stats.total_entries, 8);
        assert_eq!(stats.visible_entries, 5);
        assert_eq!(stats.unparsable_entries, 1);

        let visible: Vec<&str> = outcome
            .visibility_map
            .iter()
            .filter(|v| v.visible)
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(visible, ["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn worker_and_inline_produce_identical_bytes() {
        let config = PipelineConfig::default();
        let worker = FilterPipeline::with_strategies(
            config,
            Box::new(WorkerStrategy::from_current(Duration::from_secs(5)).unwrap()),
            Box::new(InlineStrategy),
        );
        let inline =
            FilterPipeline::with_strategies(config, Box::new(InlineStrategy), Box::new(InlineStrategy));
        assert_eq!(worker.strategy_kind(), StrategyKind::Worker);

        let mut outputs = Vec::new();
        for pipeline in [&worker, &inline, &worker] {
            let outcome = pipeline
                .filter_by_date_range(january_records(), d(2025, 1, 31), d(2025, 1, 1), stats_options())
                .await
                .unwrap();
            outputs.push(serde_json::to_vec(&outcome).unwrap());
        }
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[1], outputs[2]);
    }

    #[tokio::test]
    async fn failing_worker_falls_back_inline() {
        let pipeline = FilterPipeline::with_strategies(
            PipelineConfig::default(),
            Box::new(Failing(StrategyKind::Worker)),
            Box::new(InlineStrategy),
        );
        let outcome = pipeline
            .filter_by_date_range(january_records(), d(2025, 1, 1), d(2025, 1, 31), stats_options())
            .await
            .unwrap();
        assert_eq!(outcome.statistics.unwrap().visible_entries, 5);
    }

    #[tokio::test]
    async fn failing_fallback_surfaces_the_error() {
        let pipeline = FilterPipeline::with_strategies(
            PipelineConfig::default(),
            Box::new(Failing(StrategyKind::Worker)),
            Box::new(Failing(StrategyKind::Inline)),
        );
        let result = pipeline
            .filter_by_date_range(january_records(), d(2025, 1, 1), d(2025, 1, 31), stats_options())
            .await;
        let Err(CoreError::Pipeline { message }) = result else {
            panic!("expected a pipeline error, got {result:?}");
        };
        assert_eq!(
            message,
            "filter worker unavailable: test; inline fallback: filter worker unavailable: test"
        );
    }

    fn many_records(count: usize) -> Arc<Vec<Arc<Record>>> {
        Arc::new(
            (0..count)
                .map(|i| {
                    let date = if i % 3 == 0 { "2025-01-05" } else { "2025-03-05" };
                    Arc::new(Record::new(date, format!("r{i}"), "").with_id(format!("r{i}")))
                })
                .collect(),
        )
    }

    fn job(records: Arc<Vec<Arc<Record>>>, on_progress: ProgressFn) -> FilterJob {
        FilterJob {
            records,
            range: DateRange::new(d(2025, 1, 1), d(2025, 1, 31)),
            options: FilterOptions {
                include_statistics: true,
                on_progress: Some(on_progress),
            },
            chunk_size: 100,
            progress_threshold: 0,
        }
    }

    /// Progress callback that parks the first caller (the worker thread)
    /// until the returned sender fires or a few seconds pass.
    fn stall_first_call() -> (ProgressFn, std::sync::mpsc::Sender<()>) {
        let (release, parked) = std::sync::mpsc::channel::<()>();
        let parked = Mutex::new(parked);
        let first = std::sync::atomic::AtomicBool::new(true);
        let callback: ProgressFn = Arc::new(move |_: FilterProgress| {
            if first.swap(false, Ordering::SeqCst) {
                let _ = parked.lock().unwrap().recv_timeout(Duration::from_secs(5));
            }
        });
        (callback, release)
    }

    fn panic_first_call() -> ProgressFn {
        let first = std::sync::atomic::AtomicBool::new(true);
        Arc::new(move |_: FilterProgress| {
            if first.swap(false, Ordering::SeqCst) {
                panic!("progress sink exploded");
            }
        })
    }

    async fn inline_outcome(records: Arc<Vec<Arc<Record>>>) -> FilterOutcome {
        InlineStrategy
            .run(job(records, Arc::new(|_| {})))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn worker_timeout_is_reported() {
        let (stall, release) = stall_first_call();
        let worker = WorkerStrategy::from_current(Duration::from_millis(20)).unwrap();
        let result = worker.run(job(many_records(1_000), stall)).await;
        let _ = release.send(());
        assert!(matches!(result, Err(CoreError::WorkerTimeout { timeout_ms: 20 })));
    }

    #[tokio::test]
    async fn timed_out_worker_falls_back_to_identical_output() {
        let records = many_records(1_000);
        let (stall, release) = stall_first_call();
        let config = PipelineConfig {
            chunk_size: 100,
            progress_threshold: 0,
            ..PipelineConfig::default()
        };
        let pipeline = FilterPipeline::with_strategies(
            config,
            Box::new(WorkerStrategy::from_current(Duration::from_millis(20)).unwrap()),
            Box::new(InlineStrategy),
        );
        let outcome = pipeline
            .filter_by_date_range(
                Arc::clone(&records),
                d(2025, 1, 1),
                d(2025, 1, 31),
                FilterOptions {
                    include_statistics: true,
                    on_progress: Some(stall),
                },
            )
            .await
            .unwrap();
        let _ = release.send(());

        assert_eq!(
            serde_json::to_vec(&outcome).unwrap(),
            serde_json::to_vec(&inline_outcome(records).await).unwrap()
        );
        assert_eq!(outcome.statistics.unwrap().visible_entries, 334);
    }

    #[tokio::test]
    async fn worker_panic_is_reported_with_its_message() {
        let worker = WorkerStrategy::from_current(Duration::from_secs(5)).unwrap();
        let result = worker.run(job(many_records(300), panic_first_call())).await;
        let Err(CoreError::WorkerPanicked(message)) = result else {
            panic!("expected a worker panic, got {result:?}");
        };
        assert_eq!(message, "progress sink exploded");
    }

    #[tokio::test]
    async fn panicking_worker_falls_back_to_identical_output() {
        let records = many_records(300);
        let config = PipelineConfig {
            chunk_size: 100,
            progress_threshold: 0,
            ..PipelineConfig::default()
        };
        let pipeline = FilterPipeline::with_strategies(
            config,
            Box::new(WorkerStrategy::from_current(Duration::from_secs(5)).unwrap()),
            Box::new(InlineStrategy),
        );
        let outcome = pipeline
            .filter_by_date_range(
                Arc::clone(&records),
                d(2025, 1, 1),
                d(2025, 1, 31),
                FilterOptions {
                    include_statistics: true,
                    on_progress: Some(panic_first_call()),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, inline_outcome(records).await);
    }

    #[test]
    fn pipeline_without_runtime_filters_inline() {
        let pipeline = FilterPipeline::new(PipelineConfig::default());
        assert_eq!(pipeline.strategy_kind(), StrategyKind::Inline);
        let outcome = tokio_test::block_on(pipeline.filter_by_date_range(
            january_records(),
            d(2025, 1, 1),
            d(2025, 1, 1),
            FilterOptions::default(),
        ))
        .unwrap();
        assert!(outcome.statistics.is_none());
        assert_eq!(outcome.visibility_map.iter().filter(|v| v.visible).count(), 1);
    }

    #[tokio::test]
    async fn progress_reports_each_chunk_for_large_inputs() {
        let records: Arc<Vec<Arc<Record>>> = Arc::new(
            (0..2_500)
                .map(|i| Arc::new(Record::new("2025-01-05", format!("r{i}"), "").with_id(format!("r{i}"))))
                .collect(),
        );
        let seen = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let counter = Arc::clone(&calls);
        let config = PipelineConfig {
            chunk_size: 1_000,
            progress_threshold: 2_000,
            ..PipelineConfig::default()
        };
        let pipeline = FilterPipeline::new(config);
        pipeline
            .filter_by_date_range(
                records,
                d(2025, 1, 1),
                d(2025, 1, 31),
                FilterOptions {
                    include_statistics: false,
                    on_progress: Some(Arc::new(move |p: FilterProgress| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        sink.lock().unwrap().push(p.percent());
                    })),
                },
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*seen.lock().unwrap(), vec![40, 80, 100]);
    }

    #[test]
    fn percent_handles_empty_totals() {
        let p = FilterProgress {
            chunk: 0,
            processed: 0,
            total: 0,
        };
        assert_eq!(p.percent(), 100);
    }
}
