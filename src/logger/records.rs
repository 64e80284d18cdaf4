use chrono::{DateTime, FixedOffset};

use crate::sheets::values::{CellValue, Row};

/// Tag in the sixth column that marks a row as a rating.
pub const RATING_TAG: &str = "Rating";

/// Rendered in place of a missing rating.
pub const NO_RATING: &str = "-";

/// Optional trailing columns of an interaction row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionMetadata {
    pub status: Option<String>,
    pub rating: Option<i64>,
    pub notes: Option<String>,
}

impl InteractionMetadata {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.rating.is_none() && self.notes.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRecord {
    pub session_id: String,
    pub username: String,
    /// e.g. `question`, `answer`.
    pub interaction_type: String,
    pub content: String,
    pub timestamp: DateTime<FixedOffset>,
    pub metadata: Option<InteractionMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingRecord {
    pub session_id: String,
    /// User who closed the session.
    pub username: String,
    /// User who gave the rating.
    pub rating_user: String,
    pub rating: Option<i64>,
    pub timestamp: DateTime<FixedOffset>,
}

impl InteractionRecord {
    /// 5 columns, or 8 when metadata carries at least one field.
    pub fn into_row(self, formatted_time: String) -> Row {
        let mut row: Row = vec![
            self.session_id.into(),
            self.username.into(),
            self.interaction_type.into(),
            self.content.into(),
            formatted_time.into(),
        ];
        if let Some(meta) = self.metadata.filter(|m| !m.is_empty()) {
            row.push(meta.status.into());
            row.push(meta.rating.into());
            row.push(meta.notes.into());
        }
        row
    }
}

impl RatingRecord {
    pub fn into_row(self, formatted_time: String) -> Row {
        let rating = match self.rating {
            Some(r) => CellValue::Int(r),
            None => CellValue::from(NO_RATING),
        };
        vec![
            self.session_id.into(),
            self.username.into(),
            self.rating_user.into(),
            rating,
            formatted_time.into(),
            RATING_TAG.into(),
        ]
    }
}
