//! Canonical fields and column-semantics inference.
//!
//! The target application relabels and reorders its columns freely, so the
//! engine maps whatever it finds onto a fixed set of canonical fields:
//! header-text synonyms first, then positional defaults and content
//! heuristics when headers are missing or too sparse to trust.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};

use crate::normalize::{canonical_priority, canonical_status, looks_like_date, looks_like_user_id};

/// Canonical output fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Type,
    Priority,
    Status,
    Deadline,
    DueDate,
    CreatedBy,
    CreatedOn,
    LastUpdated,
    Comments,
    Description,
    AssignedTo,
    Category,
    Project,
    Reference,
    UpdatedBy,
    ClosedOn,
    Resolution,
}

impl Field {
    /// Every canonical field, in export column order.
    pub const ALL: [Field; 18] = [
        Field::Title,
        Field::Type,
        Field::Priority,
        Field::Status,
        Field::Deadline,
        Field::DueDate,
        Field::CreatedBy,
        Field::CreatedOn,
        Field::LastUpdated,
        Field::Comments,
        Field::Description,
        Field::AssignedTo,
        Field::Category,
        Field::Project,
        Field::Reference,
        Field::UpdatedBy,
        Field::ClosedOn,
        Field::Resolution,
    ];

    /// The first eight fields keep stable positions across known variants;
    /// they back the positional fallback.
    pub const POSITIONAL: [Field; 8] = [
        Field::Title,
        Field::Type,
        Field::Priority,
        Field::Status,
        Field::Deadline,
        Field::DueDate,
        Field::CreatedBy,
        Field::CreatedOn,
    ];

    /// Date-valued fields, in the order content inference fills them.
    pub const DATE_FIELDS: [Field; 5] = [
        Field::Deadline,
        Field::DueDate,
        Field::CreatedOn,
        Field::LastUpdated,
        Field::ClosedOn,
    ];

    /// Person-valued fields, in the order content inference fills them.
    pub const PERSON_FIELDS: [Field; 3] = [Field::CreatedBy, Field::AssignedTo, Field::UpdatedBy];

    pub fn display_name(&self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Type => "Type",
            Field::Priority => "Priority",
            Field::Status => "Status",
            Field::Deadline => "Deadline",
            Field::DueDate => "Due Date",
            Field::CreatedBy => "Created By",
            Field::CreatedOn => "Created On",
            Field::LastUpdated => "Last Updated",
            Field::Comments => "Comments",
            Field::Description => "Description",
            Field::AssignedTo => "Assigned To",
            Field::Category => "Category",
            Field::Project => "Project",
            Field::Reference => "Reference",
            Field::UpdatedBy => "Updated By",
            Field::ClosedOn => "Closed On",
            Field::Resolution => "Resolution",
        }
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;
        impl Visitor<'_> for FieldVisitor {
            type Value = Field;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a canonical field name")
            }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<Field, E> {
                Field::ALL
                    .into_iter()
                    .find(|field| field.display_name() == v)
                    .ok_or_else(|| E::custom(format!("unknown field: {v}")))
            }
        }
        deserializer.deserialize_str(FieldVisitor)
    }
}

/// Header synonyms, uppercased. Exact matches are preferred; containment
/// is tried afterwards in declaration order, so longer/more specific
/// synonyms come first.
const HEADER_SYNONYMS: &[(&str, Field)] = &[
    ("ISSUE TITLE", Field::Title),
    ("TITLE", Field::Title),
    ("NAME", Field::Title),
    ("ISSUE", Field::Title),
    ("TYPE", Field::Type),
    ("PRIORITY", Field::Priority),
    ("PRIO", Field::Priority),
    ("STATUS", Field::Status),
    ("STATE", Field::Status),
    ("DEADLINE", Field::Deadline),
    ("DUE DATE", Field::DueDate),
    ("DUE", Field::DueDate),
    ("CREATED BY", Field::CreatedBy),
    ("AUTHOR", Field::CreatedBy),
    ("REPORTER", Field::CreatedBy),
    ("CREATION DATE", Field::CreatedOn),
    ("CREATED ON", Field::CreatedOn),
    ("CREATED", Field::CreatedOn),
    ("LAST UPDATED", Field::LastUpdated),
    ("MODIFIED", Field::LastUpdated),
    ("COMMENTS", Field::Comments),
    ("NOTES", Field::Comments),
    ("DESCRIPTION", Field::Description),
    ("ASSIGNED TO", Field::AssignedTo),
    ("ASSIGNEE", Field::AssignedTo),
    ("OWNER", Field::AssignedTo),
    ("CATEGORY", Field::Category),
    ("PROJECT", Field::Project),
    ("REFERENCE", Field::Reference),
    ("UPDATED BY", Field::UpdatedBy),
    ("CHANGED BY", Field::UpdatedBy),
    ("CLOSED ON", Field::ClosedOn),
    ("CLOSED", Field::ClosedOn),
    ("RESOLUTION", Field::Resolution),
];

/// Header mappings below this count are considered too sparse to trust on
/// their own; positional defaults and content heuristics fill in.
const MIN_HEADER_MATCHES: usize = 4;

/// Mapping from canonical field to column index, stable for one run.
#[derive(Debug, Clone, Default)]
pub struct SchemaMap {
    columns: BTreeMap<Field, usize>,
    unmatched_headers: Vec<String>,
}

impl SchemaMap {
    /// Infer column semantics from header texts (when a header row
    /// rendered) and one representative row's cell texts.
    ///
    /// `Title` is always mapped; column 0 is the fallback of last resort.
    pub fn infer(header_texts: Option<&[String]>, sample_texts: &[String]) -> SchemaMap {
        let mut map = SchemaMap::default();

        if let Some(headers) = header_texts {
            map.apply_headers(headers);
        }

        if map.columns.len() < MIN_HEADER_MATCHES {
            debug!(
                mapped = map.columns.len(),
                "sparse header mapping, falling back to positional defaults"
            );
            map.apply_positional_defaults(sample_texts.len());
            map.apply_content_heuristics(sample_texts);
        }

        // Title resolves unconditionally.
        map.columns.entry(Field::Title).or_insert(0);

        info!(
            mapped = map.columns.len(),
            unmatched = map.unmatched_headers.len(),
            "schema inferred"
        );
        map
    }

    fn apply_headers(&mut self, headers: &[String]) {
        for (index, raw) in headers.iter().enumerate() {
            let header = raw.trim().to_uppercase();
            if header.is_empty() {
                continue;
            }
            match match_header(&header) {
                Some(field) => {
                    // First header wins when the application repeats one.
                    self.columns.entry(field).or_insert(index);
                }
                None => {
                    debug!(header = %raw, "unrecognized header");
                    self.unmatched_headers.push(raw.clone());
                }
            }
        }
    }

    fn apply_positional_defaults(&mut self, column_count: usize) {
        for (index, field) in Field::POSITIONAL.into_iter().enumerate() {
            if index >= column_count {
                break;
            }
            if !self.columns.values().any(|&i| i == index) {
                self.columns.entry(field).or_insert(index);
            }
        }
    }

    fn apply_content_heuristics(&mut self, sample_texts: &[String]) {
        let positional_end = Field::POSITIONAL.len().min(sample_texts.len());
        for (index, text) in sample_texts.iter().enumerate().skip(positional_end) {
            let text = text.trim();
            if text.is_empty() || self.columns.values().any(|&i| i == index) {
                continue;
            }
            if looks_like_date(text) {
                if let Some(slot) = self.first_unmapped(&Field::DATE_FIELDS) {
                    self.columns.insert(slot, index);
                }
            } else if looks_like_user_id(text) {
                if let Some(slot) = self.first_unmapped(&Field::PERSON_FIELDS) {
                    self.columns.insert(slot, index);
                }
            } else if canonical_status(text).is_some() {
                self.columns.entry(Field::Status).or_insert(index);
            } else if canonical_priority(text).is_some() {
                self.columns.entry(Field::Priority).or_insert(index);
            }
        }
    }

    fn first_unmapped(&self, candidates: &[Field]) -> Option<Field> {
        candidates
            .iter()
            .copied()
            .find(|f| !self.columns.contains_key(f))
    }

    /// Column index for a field, `None` when unmapped.
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Title column, guaranteed present after [`SchemaMap::infer`].
    pub fn title_column(&self) -> usize {
        self.column(Field::Title).unwrap_or(0)
    }

    /// Number of mapped fields.
    pub fn mapped_len(&self) -> usize {
        self.columns.len()
    }

    /// Headers that matched no synonym (recorded, not mapped).
    pub fn unmatched_headers(&self) -> &[String] {
        &self.unmatched_headers
    }

    /// Mapped (field, column) pairs.
    pub fn mappings(&self) -> impl Iterator<Item = (Field, usize)> + '_ {
        self.columns.iter().map(|(f, i)| (*f, *i))
    }
}

/// Match one uppercased header against the synonym table: exact first,
/// then containment in declaration order.
fn match_header(header: &str) -> Option<Field> {
    HEADER_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == header)
        .or_else(|| {
            HEADER_SYNONYMS
                .iter()
                .find(|(synonym, _)| header.contains(synonym))
        })
        .map(|(_, field)| *field)
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
