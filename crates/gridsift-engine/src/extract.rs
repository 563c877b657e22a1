//! Per-row extraction with layered fallbacks.
//!
//! A row is never trusted to segment cleanly: the extractor walks a ladder
//! of cell-segmentation strategies, then a ladder of value-reading
//! techniques per cell, then field-specific semantic rescues for the values
//! structure alone could not produce. One broken row never aborts the
//! batch; it becomes a logged [`RowOutcome::Skip`].

use tracing::{debug, warn};

use gridsift_page::{ElementHandle, PageError, PageHandle, Query};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::locator::LocatorChain;
use crate::normalize::{
    self, canonical_priority, canonical_status, find_dates, normalize_record,
};
use crate::record::IssueRecord;
use crate::schema::{Field, SchemaMap};
use crate::targets;

/// Why a row produced no record.
#[derive(Debug)]
pub enum SkipReason {
    /// No title survived any fallback; decorative or malformed row.
    EmptyTitle,
    /// No cell segmentation strategy produced content.
    NoCells,
    /// A non-fatal page error exhausted the row's fallbacks.
    RowError(PageError),
}

/// Outcome of extracting one row.
#[derive(Debug)]
pub enum RowOutcome {
    Record(IssueRecord),
    Skip(SkipReason),
}

/// Extracts and normalizes one record per rendered row.
pub struct RowExtractor<'a> {
    page: &'a dyn PageHandle,
    locator: &'a LocatorChain<'a>,
    config: &'a EngineConfig,
}

impl<'a> RowExtractor<'a> {
    pub fn new(
        page: &'a dyn PageHandle,
        locator: &'a LocatorChain<'a>,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            page,
            locator,
            config,
        }
    }

    /// Extract one row against the inferred schema.
    ///
    /// Only session loss escalates; every other failure mode resolves to
    /// `Skip` so the batch keeps moving.
    pub async fn extract(
        &self,
        row: &ElementHandle,
        schema: &SchemaMap,
    ) -> Result<RowOutcome, EngineError> {
        let cells = match self.cell_texts(row).await? {
            Some(texts) if !texts.is_empty() => texts,
            _ => return Ok(RowOutcome::Skip(SkipReason::NoCells)),
        };

        let row_text = self.row_text(row).await?;
        let mut record = IssueRecord::new();

        for (field, index) in schema.mappings() {
            if let Some(value) = cells.get(index) {
                record.set(field, value.trim());
            }
        }

        self.rescue_semantics(row, &mut record, &row_text).await?;

        // Title is the one hard requirement.
        let title = normalize::strip_control_labels(record.get(Field::Title));
        let title = if title.is_empty() {
            self.title_fallback(&cells, &row_text)
        } else {
            title
        };
        if title.is_empty() {
            debug!("row yielded no title, skipping");
            return Ok(RowOutcome::Skip(SkipReason::EmptyTitle));
        }
        record.set(Field::Title, title);

        normalize_record(&mut record, self.config.max_field_len);
        Ok(RowOutcome::Record(record))
    }

    /// Cell texts for a row via the segmentation ladder, with the row-text
    /// line split as the strategy of last resort. `None` when even the
    /// row's own text is unreadable.
    pub async fn cell_texts(
        &self,
        row: &ElementHandle,
    ) -> Result<Option<Vec<String>>, EngineError> {
        for spec in targets::CELL_LADDER {
            let handles = self.locator.resolve_all(spec, Some(row)).await?;
            // Fewer than three cells means we probably caught a wrapper
            // element, not the actual segmentation.
            if handles.len() < 3 {
                continue;
            }
            let mut texts = Vec::with_capacity(handles.len());
            for handle in &handles {
                texts.push(self.cell_value(handle).await?);
            }
            if texts.iter().filter(|t| !t.trim().is_empty()).count() >= 2 {
                return Ok(Some(texts));
            }
        }

        // Last resort: split the row text into pseudo-cells by line break.
        let text = self.row_text(row).await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let pseudo: Vec<String> = text
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Ok(Some(pseudo))
    }

    /// Header cell texts for schema inference.
    pub async fn header_texts(
        &self,
        header_row: &ElementHandle,
    ) -> Result<Vec<String>, EngineError> {
        let cells = self
            .locator
            .resolve_all(&targets::HEADER_CELLS, Some(header_row))
            .await?;
        let mut texts = Vec::with_capacity(cells.len());
        for cell in &cells {
            match self.page.text(cell).await {
                Ok(text) => texts.push(text),
                Err(err) if err.is_fatal() => return Err(EngineError::Session(err)),
                Err(_) => texts.push(String::new()),
            }
        }
        Ok(texts)
    }

    /// Value-reading ladder for one cell: direct text, value-bearing
    /// attributes, first descendant with text, script-evaluated content.
    async fn cell_value(&self, cell: &ElementHandle) -> Result<String, EngineError> {
        match self.page.text(cell).await {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => {}
            Err(err) if err.is_fatal() => return Err(EngineError::Session(err)),
            Err(_) => {}
        }

        for attr in ["title", "aria-label", "value"] {
            match self.page.attribute(cell, attr).await {
                Ok(Some(value)) if !value.trim().is_empty() => return Ok(value),
                Ok(_) => {}
                Err(err) if err.is_fatal() => return Err(EngineError::Session(err)),
                Err(_) => {}
            }
        }

        if let Ok(descendants) = self.page.query(&Query::Css("*"), Some(cell)).await {
            for descendant in descendants {
                if let Ok(text) = self.page.text(&descendant).await {
                    if !text.trim().is_empty() {
                        return Ok(text);
                    }
                }
            }
        }

        match self
            .page
            .evaluate_on(cell, "function () { return this.textContent || ''; }")
            .await
        {
            Ok(value) => Ok(value.as_str().unwrap_or_default().to_string()),
            Err(err) if err.is_fatal() => Err(EngineError::Session(err)),
            Err(_) => Ok(String::new()),
        }
    }

    /// Field-specific rescues for values structural mapping missed.
    async fn rescue_semantics(
        &self,
        row: &ElementHandle,
        record: &mut IssueRecord,
        row_text: &str,
    ) -> Result<(), EngineError> {
        // Priority from colored badge classes when the cell has no text.
        if canonical_priority(record.get(Field::Priority)).is_none() {
            if let Some(priority) = self.priority_from_badges(row).await? {
                record.set(Field::Priority, priority);
            }
        }

        // Status from the fixed vocabulary anywhere in the row.
        if canonical_status(record.get(Field::Status)).is_none() {
            if let Some(status) = canonical_status(row_text) {
                record.set(Field::Status, status);
            }
        }

        // Dates pattern-matched across the whole row when mapped cells
        // came up empty, assigned in date-field order.
        if Field::DATE_FIELDS
            .iter()
            .any(|f| record.get(*f).is_empty())
        {
            // Dates already sitting in a mapped cell stay where they are.
            let mut dates = find_dates(row_text)
                .into_iter()
                .filter(|date| {
                    Field::DATE_FIELDS
                        .iter()
                        .all(|f| record.get(*f) != date.as_str())
                })
                .collect::<Vec<_>>()
                .into_iter();
            for field in Field::DATE_FIELDS {
                if record.get(field).is_empty() {
                    match dates.next() {
                        Some(date) => record.set(field, date),
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }

    /// Inspect badge classes within the row for a priority indicator.
    async fn priority_from_badges(
        &self,
        row: &ElementHandle,
    ) -> Result<Option<&'static str>, EngineError> {
        let badges = match self
            .page
            .query(&Query::Css("[class*='Badge'], [class*='Indicator'], [class*='Icon']"), Some(row))
            .await
        {
            Ok(badges) => badges,
            Err(err) if err.is_fatal() => return Err(EngineError::Session(err)),
            Err(_) => return Ok(None),
        };
        for badge in badges {
            let class = match self.page.attribute(&badge, "class").await {
                Ok(Some(class)) => class.to_lowercase(),
                Ok(None) => continue,
                Err(err) if err.is_fatal() => return Err(EngineError::Session(err)),
                Err(_) => continue,
            };
            for (fragment, priority) in targets::PRIORITY_BADGES.iter().copied() {
                if class.contains(fragment) {
                    return Ok(Some(priority));
                }
            }
        }
        Ok(None)
    }

    /// Title fallback: first non-empty cell, else the first line of the
    /// row's own text.
    fn title_fallback(&self, cells: &[String], row_text: &str) -> String {
        let from_cells = cells
            .iter()
            .map(|c| normalize::strip_control_labels(c))
            .find(|c| !c.is_empty());
        match from_cells {
            Some(title) => title,
            None => normalize::strip_control_labels(
                row_text.lines().next().unwrap_or_default(),
            ),
        }
    }

    /// Full visible text of the row, with fatal errors escalated and
    /// everything else reading as empty.
    async fn row_text(&self, row: &ElementHandle) -> Result<String, EngineError> {
        match self.page.text(row).await {
            Ok(text) => Ok(text),
            Err(err) if err.is_fatal() => Err(EngineError::Session(err)),
            Err(err) => {
                warn!(%err, "row text unreadable");
                Ok(String::new())
            }
        }
    }
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
