pub mod a1;
pub mod auth;
pub mod client;
pub mod setup;
pub mod spreadsheet;
pub mod values;
pub mod worksheet;

pub use client::SheetsClient;
pub use setup::{get_sheets_client, SheetsSetup};
pub use values::{CellValue, Row};
pub use worksheet::{Worksheet, WorksheetHandle};
