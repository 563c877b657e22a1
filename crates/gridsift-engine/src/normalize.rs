//! Field normalization: fixed vocabularies, date and user-id patterns,
//! control-label stripping, and column-shift repair.
//!
//! Everything here is a pure function over strings, and every pass is a
//! fixed point: normalizing an already-normalized value returns it
//! unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::IssueRecord;
use crate::schema::Field;

/// Canonical status vocabulary, longest match first.
const STATUSES: &[&str] = &[
    "READY FOR PUBLISHING",
    "IN PROGRESS",
    "ACCEPTED",
    "CLOSED",
    "DRAFT",
    "READY",
    "OPEN",
    "DONE",
];

/// Canonical priority vocabulary, longest match first.
const PRIORITIES: &[&str] = &["Very High", "High", "Medium", "Low"];

/// UI control labels that leak into row text when a cell renders an
/// expander next to its value.
static CONTROL_LABELS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Show more|Show less|Mostrar más|Mostrar menos|Ver más|Ver menos)\b")
        .expect("control label pattern")
});

static MONTH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}\b",
    )
    .expect("month date pattern")
});

static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}|\d{4}-\d{2}-\d{2})\b")
        .expect("numeric date pattern")
});

static USER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]\d{5,7}$").expect("user id pattern"));

/// Map raw priority text onto the fixed vocabulary. `None` when the text
/// carries no recognizable priority.
pub fn canonical_priority(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    PRIORITIES
        .iter()
        .find(|p| lower.contains(&p.to_lowercase()))
        .copied()
}

/// Map raw status text onto the fixed vocabulary. `None` when the text
/// carries no recognizable status.
pub fn canonical_status(raw: &str) -> Option<&'static str> {
    let upper = raw.to_uppercase();
    STATUSES.iter().find(|s| upper.contains(*s)).copied()
}

/// Whether the text contains something that reads as a date.
pub fn looks_like_date(text: &str) -> bool {
    MONTH_DATE.is_match(text) || NUMERIC_DATE.is_match(text)
}

/// All date-shaped substrings in document order.
pub fn find_dates(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = MONTH_DATE
        .find_iter(text)
        .map(|m| (m.start(), m.as_str().to_string()))
        .chain(
            NUMERIC_DATE
                .find_iter(text)
                .map(|m| (m.start(), m.as_str().to_string())),
        )
        .collect();
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, s)| s).collect()
}

/// Whether the text is an internal user id (e.g. `I587465`).
pub fn looks_like_user_id(text: &str) -> bool {
    USER_ID.is_match(text.trim())
}

/// Strip expander labels and collapse the leftover whitespace.
pub fn strip_control_labels(text: &str) -> String {
    let cleaned = CONTROL_LABELS.replace_all(text, " ");
    collapse_whitespace(&cleaned)
}

/// Collapse runs of whitespace (including newlines) to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a char boundary, appending an ellipsis marker once.
pub fn truncate_value(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_len.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// In-place normalization of a freshly extracted record.
///
/// Canonicalizes status and priority, cleans the title, coerces empty
/// fields to `"N/A"`, and truncates pathological values. Idempotent.
pub fn normalize_record(record: &mut IssueRecord, max_field_len: usize) {
    repair_shifts(record);

    let title = strip_control_labels(record.get(Field::Title));
    record.set(Field::Title, title);

    if let Some(status) = canonical_status(record.get(Field::Status)) {
        record.set(Field::Status, status);
    }
    if let Some(priority) = canonical_priority(record.get(Field::Priority)) {
        record.set(Field::Priority, priority);
    }

    for field in Field::ALL {
        let value = record.get(field);
        let collapsed = collapse_whitespace(value);
        let bounded = truncate_value(&collapsed, max_field_len);
        if bounded.is_empty() || bounded == "N/A" {
            record.clear(field);
        } else {
            record.set(field, bounded);
        }
    }
}

/// Repair column-shift artifacts left by drifted segmentation.
///
/// The table variants occasionally insert a leading icon cell or merge the
/// title into its neighbor, which lands values one column off. The repairs
/// are conservative: a value only moves when both sides of the swap agree
/// with their vocabularies.
pub fn repair_shifts(record: &mut IssueRecord) {
    // A Type identical to the Title is a segmentation echo, not data.
    if !record.get(Field::Type).is_empty() && record.get(Field::Type) == record.get(Field::Title) {
        record.clear(Field::Type);
    }

    // Status landed in a neighboring column.
    if canonical_status(record.get(Field::Status)).is_none() {
        for field in [Field::Priority, Field::Type, Field::Deadline] {
            if canonical_status(record.get(field)).is_some() {
                record.swap(Field::Status, field);
                break;
            }
        }
    }

    // Priority landed in a neighboring column.
    if canonical_priority(record.get(Field::Priority)).is_none() {
        for field in [Field::Type, Field::Status] {
            if canonical_priority(record.get(field)).is_some()
                && canonical_status(record.get(field)).is_none()
            {
                record.swap(Field::Priority, field);
                break;
            }
        }
    }

    // A date-shaped value in a non-date column trades places with a
    // non-date value in a date column.
    for date_field in Field::DATE_FIELDS {
        let value = record.get(date_field);
        if !value.is_empty() && !looks_like_date(value) {
            for field in [Field::Status, Field::Priority, Field::Type] {
                if looks_like_date(record.get(field))
                    && canonical_status(record.get(field)).is_none()
                {
                    record.swap(date_field, field);
                    break;
                }
            }
        }
    }

    // Created By holding a date means the author column was absent; park
    // the date in the first empty date slot.
    if looks_like_date(record.get(Field::CreatedBy)) {
        if let Some(slot) = Field::DATE_FIELDS
            .iter()
            .copied()
            .find(|f| record.get(*f).is_empty())
        {
            let date = record.get(Field::CreatedBy).to_string();
            record.set(slot, date);
            record.clear(Field::CreatedBy);
        }
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
