use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;

use crate::config::SheetsConfig;
use crate::errors::{SheetsError, SheetsResult};
use crate::logger::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::logger::records::{InteractionRecord, RatingRecord};
use crate::sheets::values::{CellValue, Row};
use crate::sheets::worksheet::Worksheet;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy)]
enum WriteOp {
    AppendRow,
    UpdateCell,
    BatchUpdate,
}

impl WriteOp {
    fn exhausted(self) -> &'static str {
        match self {
            WriteOp::AppendRow => "append row",
            WriteOp::UpdateCell => "update cell",
            WriteOp::BatchUpdate => "perform batch update",
        }
    }

    fn unexpected(self) -> &'static str {
        match self {
            WriteOp::AppendRow => "appending row",
            WriteOp::UpdateCell => "updating cell",
            WriteOp::BatchUpdate => "in batch update",
        }
    }
}

/// Best-effort writer for a shared worksheet.
///
/// Every public operation returns `true` on success and `false` on any
/// failure; nothing is raised to the caller. Transient API errors are retried
/// back to back up to the attempt budget, any other error gives up at once.
/// Failures are reported through the injected [`Diagnostics`].
pub struct SheetsLogger {
    worksheet: Arc<dyn Worksheet>,
    timezone: Tz,
    default_attempts: u32,
    diagnostics: Arc<dyn Diagnostics>,
}

impl SheetsLogger {
    pub fn new(worksheet: Arc<dyn Worksheet>, timezone: Tz) -> Self {
        Self {
            worksheet,
            timezone,
            default_attempts: DEFAULT_MAX_ATTEMPTS,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn from_config(worksheet: Arc<dyn Worksheet>, config: &SheetsConfig) -> SheetsResult<Self> {
        Ok(Self::new(worksheet, config.timezone()?)
            .with_default_attempts(config.logger.retry_attempts))
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_default_attempts(mut self, attempts: u32) -> Self {
        self.default_attempts = attempts;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Renders `timestamp` as civil time in the logger's zone.
    pub fn format_timestamp<Z: TimeZone>(&self, timestamp: &DateTime<Z>) -> String {
        timestamp
            .with_timezone(&self.timezone)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }

    pub async fn append_row(&self, row: Row) -> bool {
        self.append_row_with(row, self.default_attempts).await
    }

    pub async fn append_row_with(&self, row: Row, max_attempts: u32) -> bool {
        let worksheet = &self.worksheet;
        let row = &row;
        self.retry(WriteOp::AppendRow, max_attempts, move || {
            worksheet.append_row(row)
        })
        .await
    }

    pub async fn update_cell(&self, row: u32, col: u32, value: CellValue) -> bool {
        self.update_cell_with(row, col, value, self.default_attempts).await
    }

    pub async fn update_cell_with(
        &self,
        row: u32,
        col: u32,
        value: CellValue,
        max_attempts: u32,
    ) -> bool {
        if row == 0 || col == 0 {
            let e = SheetsError::InvalidArgument(format!(
                "cell coordinates are 1-based, got ({row}, {col})"
            ));
            self.diagnostics
                .error(&format!("Unexpected error {}: {e}", WriteOp::UpdateCell.unexpected()));
            return false;
        }
        let worksheet = &self.worksheet;
        let value = &value;
        self.retry(WriteOp::UpdateCell, max_attempts, move || {
            worksheet.update_cell(row, col, value)
        })
        .await
    }

    pub async fn batch_update(&self, range_name: &str, values: Vec<Row>) -> bool {
        self.batch_update_with(range_name, values, self.default_attempts)
            .await
    }

    pub async fn batch_update_with(
        &self,
        range_name: &str,
        values: Vec<Row>,
        max_attempts: u32,
    ) -> bool {
        let worksheet = &self.worksheet;
        let values = values.as_slice();
        self.retry(WriteOp::BatchUpdate, max_attempts, move || {
            worksheet.batch_update(range_name, values)
        })
        .await
    }

    pub async fn log_interaction(&self, record: InteractionRecord) -> bool {
        let formatted_time = self.format_timestamp(&record.timestamp);
        self.append_row(record.into_row(formatted_time)).await
    }

    pub async fn log_rating(&self, record: RatingRecord) -> bool {
        let formatted_time = self.format_timestamp(&record.timestamp);
        self.append_row(record.into_row(formatted_time)).await
    }

    async fn retry<F, Fut>(&self, op: WriteOp, max_attempts: u32, mut call: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SheetsResult<()>>,
    {
        if max_attempts == 0 {
            self.diagnostics.error(&format!(
                "Failed to {} after 0 attempts: attempt budget is zero",
                op.exhausted()
            ));
            return false;
        }

        for attempt in 1..=max_attempts {
            match call().await {
                Ok(()) => {
                    tracing::debug!(op = op.exhausted(), attempt, "sheet write succeeded");
                    return true;
                }
                Err(e) if e.is_transient() => {
                    if attempt == max_attempts {
                        self.diagnostics.error(&format!(
                            "Failed to {} after {max_attempts} attempts: {e}",
                            op.exhausted()
                        ));
                        return false;
                    }
                    self.diagnostics
                        .warn(&format!("Attempt {attempt} failed, retrying..."));
                }
                Err(e) => {
                    self.diagnostics
                        .error(&format!("Unexpected error {}: {e}", op.unexpected()));
                    return false;
                }
            }
        }
        false
    }
}
