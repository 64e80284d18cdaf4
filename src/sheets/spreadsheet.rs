use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;

use crate::errors::{SheetsError, SheetsResult};
use crate::sheets::client::{ApiRequest, SheetsClient};
use crate::sheets::worksheet::{SheetProperties, WorksheetHandle};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetResource {
    #[serde(default)]
    sheets: Vec<SheetResource>,
}

#[derive(Debug, Deserialize)]
struct SheetResource {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<BatchReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchReply {
    add_sheet: Option<SheetResource>,
}

/// An opened spreadsheet document and the metadata of its tabs.
pub struct Spreadsheet {
    client: Arc<SheetsClient>,
    id: String,
    sheets: Vec<SheetProperties>,
}

impl Spreadsheet {
    /// Fetches spreadsheet metadata by id.
    pub async fn open(client: Arc<SheetsClient>, id: &str) -> SheetsResult<Self> {
        let request = open_request(id);
        let resource: SpreadsheetResource = client.send_as(request).await?;
        let mut sheets: Vec<SheetProperties> =
            resource.sheets.into_iter().map(|s| s.properties).collect();
        sheets.sort_by_key(|p| p.index);

        tracing::debug!(spreadsheet = id, tabs = sheets.len(), "spreadsheet metadata loaded");

        Ok(Self {
            client,
            id: id.to_string(),
            sheets,
        })
    }

    /// The first tab, in display order.
    pub fn sheet1(&self) -> SheetsResult<WorksheetHandle> {
        let properties = self.sheets.first().cloned().ok_or_else(|| {
            SheetsError::UnexpectedResponse(format!("spreadsheet {} has no worksheets", self.id))
        })?;
        Ok(WorksheetHandle::new(self.client.clone(), self.id.clone(), properties))
    }

    /// Adds a new tab with the given grid size.
    pub async fn add_worksheet(
        &mut self,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> SheetsResult<WorksheetHandle> {
        let response: BatchUpdateResponse = self
            .client
            .send_as(add_sheet_request(&self.id, title, rows, cols))
            .await?;
        let properties = response
            .replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|s| s.properties)
            .ok_or_else(|| {
                SheetsError::UnexpectedResponse("addSheet reply missing from response".into())
            })?;

        self.sheets.push(properties.clone());
        Ok(WorksheetHandle::new(self.client.clone(), self.id.clone(), properties))
    }
}

fn open_request(id: &str) -> ApiRequest {
    ApiRequest::new(Method::GET, vec!["spreadsheets".to_string(), id.to_string()])
        .query("fields", "sheets.properties")
}

fn add_sheet_request(id: &str, title: &str, rows: u32, cols: u32) -> ApiRequest {
    ApiRequest::new(Method::POST, vec!["spreadsheets".to_string(), format!("{id}:batchUpdate")])
        .body(serde_json::json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "sheetType": "GRID",
                        "gridProperties": { "rowCount": rows, "columnCount": cols },
                    }
                }
            }]
        }))
}
