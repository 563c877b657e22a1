//! Run orchestration: the fixed-order pipeline over one page session.

use tracing::{debug, info, warn};

use gridsift_page::PageHandle;

use crate::config::EngineConfig;
use crate::convergence::LazyLoadConvergence;
use crate::error::EngineError;
use crate::extract::{RowExtractor, RowOutcome};
use crate::locator::{Action, LocatorChain};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::record::{duplicate_title_count, ExtractionReport};
use crate::schema::SchemaMap;
use crate::targets;

/// One extraction run against one live page.
///
/// Drives the pipeline in fixed order: activate navigation, widen the
/// visible column set, converge lazy loading, infer the schema from the
/// first rendered row, extract every row, and report duplicate-title
/// statistics. Rows with colliding titles are retained; collision counts
/// exist for observability, not filtering.
pub struct ExtractionRun<'a> {
    page: &'a dyn PageHandle,
    config: EngineConfig,
    sink: &'a dyn ProgressSink,
}

impl<'a> ExtractionRun<'a> {
    pub fn new(
        page: &'a dyn PageHandle,
        config: EngineConfig,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self { page, config, sink }
    }

    /// Execute the pipeline.
    ///
    /// An empty record list inside `Ok` is a valid (if degenerate) result;
    /// `Err` means the page session itself became unusable.
    pub async fn run(&self) -> Result<ExtractionReport, EngineError> {
        match self.page.ready().await {
            Ok(_) => {}
            Err(err) if err.is_fatal() => return Err(EngineError::Session(err)),
            Err(err) => debug!(%err, "readiness probe failed, continuing"),
        }

        let locator = LocatorChain::new(self.page, self.config.retry.clone());
        let extractor = RowExtractor::new(self.page, &locator, &self.config);
        let convergence =
            LazyLoadConvergence::new(self.page, &locator, &self.config, self.sink);

        self.activate_data_view(&locator).await?;
        self.widen_columns(&locator).await?;

        let target = convergence.probe_target_estimate().await?;
        let load = convergence.load_all(target).await?;

        let rows = locator.resolve_all(&targets::TABLE_ROWS, None).await?;
        if rows.is_empty() {
            info!("no data rows rendered; returning empty result");
            self.sink.notify(&ProgressEvent::Completed {
                extracted: 0,
                skipped: 0,
            });
            return Ok(ExtractionReport {
                records: Vec::new(),
                rows_seen: 0,
                rows_skipped: 0,
                duplicate_titles: 0,
                load,
            });
        }

        let schema = self.infer_schema(&locator, &extractor, &rows[0]).await?;

        let total = rows.len();
        let mut records = Vec::with_capacity(total);
        let mut skipped = 0usize;
        for (index, row) in rows.iter().enumerate() {
            match extractor.extract(row, &schema).await? {
                RowOutcome::Record(record) => records.push(record),
                RowOutcome::Skip(reason) => {
                    debug!(row = index, ?reason, "row skipped");
                    skipped += 1;
                }
            }
            if (index + 1) % 10 == 0 || index + 1 == total {
                self.sink.notify(&ProgressEvent::RowsExtracted {
                    done: index + 1,
                    total,
                });
            }
        }

        let duplicate_titles = duplicate_title_count(&records);
        if duplicate_titles > 0 {
            info!(
                duplicate_titles,
                "duplicate-titled rows retained; counts reported for downstream policy"
            );
        }

        info!(
            extracted = records.len(),
            skipped,
            rows_seen = total,
            "extraction complete"
        );
        self.sink.notify(&ProgressEvent::Completed {
            extracted: records.len(),
            skipped,
        });

        Ok(ExtractionReport {
            records,
            rows_seen: total,
            rows_skipped: skipped,
            duplicate_titles,
            load,
        })
    }

    /// Switch the work area to the issue list. Absence is non-fatal: some
    /// entry points land directly on the data view.
    async fn activate_data_view(&self, locator: &LocatorChain<'_>) -> Result<(), EngineError> {
        let found = locator
            .resolve_and_act(&targets::DATA_TAB, Action::Click)
            .await?;
        self.sink.notify(&ProgressEvent::NavigationResolved {
            target: targets::DATA_TAB.target,
            found,
        });
        if !found {
            debug!("data tab not found; assuming the data view is already active");
        }
        Ok(())
    }

    /// Best-effort column widening through the settings dialog so the
    /// extraction sees every available column. Every step is optional and
    /// degrades gracefully when the dialog has drifted or is absent.
    async fn widen_columns(&self, locator: &LocatorChain<'_>) -> Result<(), EngineError> {
        if !locator
            .resolve_and_act(&targets::SETTINGS_BUTTON, Action::Click)
            .await?
        {
            debug!("settings control absent; extracting the default column set");
            return Ok(());
        }

        let steps = [
            &targets::SELECT_COLUMNS_TAB,
            &targets::SELECT_ALL_CHECKBOX,
            &targets::CONFIRM_BUTTON,
        ];
        for spec in steps {
            if !locator.resolve_and_act(spec, Action::Click).await? {
                warn!(step = spec.target, "column widening step failed; continuing");
                return Ok(());
            }
        }
        info!("column set widened to all available columns");
        Ok(())
    }

    /// Infer column semantics from the header row (when present) and the
    /// first rendered data row.
    async fn infer_schema(
        &self,
        locator: &LocatorChain<'_>,
        extractor: &RowExtractor<'_>,
        first_row: &gridsift_page::ElementHandle,
    ) -> Result<SchemaMap, EngineError> {
        let header_texts = match locator.resolve(&targets::HEADER_ROW, None).await? {
            Some(header_row) => Some(extractor.header_texts(&header_row).await?),
            None => None,
        };
        let sample = extractor
            .cell_texts(first_row)
            .await?
            .unwrap_or_default();

        let schema = SchemaMap::infer(header_texts.as_deref(), &sample);
        self.sink.notify(&ProgressEvent::SchemaInferred {
            mapped_fields: schema.mapped_len(),
        });
        Ok(schema)
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
