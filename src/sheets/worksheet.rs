use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;

use crate::errors::SheetsResult;
use crate::sheets::a1::{absolute_range, quote_title, rowcol_to_a1};
use crate::sheets::client::{ApiRequest, SheetsClient};
use crate::sheets::values::{CellValue, Row};

const VALUE_INPUT_OPTION: &str = "RAW";
/// Single-cell writes are parsed like typed input, so formulas and numbers survive.
const CELL_INPUT_OPTION: &str = "USER_ENTERED";

/// Primitive writes against one worksheet tab.
///
/// The retrying writer only sees this trait, so any backend (or a test double)
/// that can append a row, set a cell and write a range can sit behind it.
#[async_trait]
pub trait Worksheet: Send + Sync {
    fn title(&self) -> &str;

    /// Appends `row` after the last non-empty row of the sheet.
    async fn append_row(&self, row: &[CellValue]) -> SheetsResult<()>;

    /// Overwrites the cell at 1-based (`row`, `col`).
    async fn update_cell(&self, row: u32, col: u32, value: &CellValue) -> SheetsResult<()>;

    /// Writes `values` over `range_name` in a single request.
    async fn batch_update(&self, range_name: &str, values: &[Row]) -> SheetsResult<()>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(default)]
    pub row_count: u32,
    #[serde(default)]
    pub column_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: u32,
    pub grid_properties: Option<GridProperties>,
}

/// Write access to one tab of a spreadsheet over the REST API.
pub struct WorksheetHandle {
    client: Arc<SheetsClient>,
    spreadsheet_id: String,
    properties: SheetProperties,
}

impl WorksheetHandle {
    pub fn new(client: Arc<SheetsClient>, spreadsheet_id: String, properties: SheetProperties) -> Self {
        Self {
            client,
            spreadsheet_id,
            properties,
        }
    }

    pub fn properties(&self) -> &SheetProperties {
        &self.properties
    }

    fn values_segments(&self, tail: String) -> Vec<String> {
        vec![
            "spreadsheets".to_string(),
            self.spreadsheet_id.clone(),
            "values".to_string(),
            tail,
        ]
    }

    pub fn append_request(&self, row: &[CellValue]) -> ApiRequest {
        let range = format!("{}!A1", quote_title(&self.properties.title));
        ApiRequest::new(Method::POST, self.values_segments(format!("{range}:append")))
            .query("valueInputOption", VALUE_INPUT_OPTION)
            .query("insertDataOption", "INSERT_ROWS")
            .body(serde_json::json!({ "values": [row] }))
    }

    pub fn update_cell_request(
        &self,
        row: u32,
        col: u32,
        value: &CellValue,
    ) -> SheetsResult<ApiRequest> {
        let cell = rowcol_to_a1(row, col)?;
        let range = absolute_range(&self.properties.title, &cell);
        Ok(ApiRequest::new(Method::PUT, self.values_segments(range))
            .query("valueInputOption", CELL_INPUT_OPTION)
            .body(serde_json::json!({ "values": [[value]] })))
    }

    pub fn batch_update_request(&self, range_name: &str, values: &[Row]) -> ApiRequest {
        let range = absolute_range(&self.properties.title, range_name);
        ApiRequest::new(
            Method::POST,
            vec![
                "spreadsheets".to_string(),
                self.spreadsheet_id.clone(),
                "values:batchUpdate".to_string(),
            ],
        )
        .body(serde_json::json!({
            "valueInputOption": VALUE_INPUT_OPTION,
            "data": [{ "range": range, "values": values }],
        }))
    }
}

#[async_trait]
impl Worksheet for WorksheetHandle {
    fn title(&self) -> &str {
        &self.properties.title
    }

    async fn append_row(&self, row: &[CellValue]) -> SheetsResult<()> {
        self.client.send(self.append_request(row)).await?;
        Ok(())
    }

    async fn update_cell(&self, row: u32, col: u32, value: &CellValue) -> SheetsResult<()> {
        let request = self.update_cell_request(row, col, value)?;
        self.client.send(request).await?;
        Ok(())
    }

    async fn batch_update(&self, range_name: &str, values: &[Row]) -> SheetsResult<()> {
        self.client
            .send(self.batch_update_request(range_name, values))
            .await?;
        Ok(())
    }
}
