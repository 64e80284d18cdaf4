pub mod config;
pub mod errors;
pub mod logger;
pub mod sheets;

use chrono::Utc;

use crate::logger::{InteractionMetadata, InteractionRecord, RatingRecord, SheetsLogger};
use crate::sheets::{CellValue, Row, SheetsSetup};

/// Example driver: connect, log one interaction and one rating, then write a
/// small header block.
pub async fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let config = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            return;
        }
    };

    tracing::info!("Setting up Google Sheets connection");
    let mut setup = SheetsSetup::new(config);
    if setup.setup_connection().await.is_none() {
        tracing::error!("Failed to set up Google Sheets connection");
        return;
    }

    let Some(worksheet) = setup.connect_to_spreadsheet(None).await else {
        tracing::error!("Failed to connect to spreadsheet");
        return;
    };

    let logger = match SheetsLogger::from_config(worksheet, setup.config()) {
        Ok(logger) => logger,
        Err(e) => {
            tracing::error!(error = %e, "Invalid logger configuration");
            return;
        }
    };
    let session_id = format!("session_{}", uuid::Uuid::new_v4().simple());

    tracing::info!(session = %session_id, "Logging an example interaction");
    let success = logger
        .log_interaction(InteractionRecord {
            session_id: session_id.clone(),
            username: "test_user".to_string(),
            interaction_type: "question".to_string(),
            content: "How do I use this API?".to_string(),
            timestamp: Utc::now().fixed_offset(),
            metadata: Some(InteractionMetadata {
                status: Some("open".to_string()),
                rating: None,
                notes: Some("First time user".to_string()),
            }),
        })
        .await;
    tracing::info!(success, "Interaction logged");

    tracing::info!(session = %session_id, "Logging an example rating");
    let success = logger
        .log_rating(RatingRecord {
            session_id,
            username: "test_user".to_string(),
            rating_user: "feedback_user".to_string(),
            rating: Some(5),
            timestamp: Utc::now().fixed_offset(),
        })
        .await;
    tracing::info!(success, "Rating logged");

    tracing::info!("Performing a batch update");
    let values: Vec<Row> = vec![
        vec![CellValue::from("Header 1"), CellValue::from("Header 2")],
        vec![CellValue::from("Value 1"), CellValue::from("Value 2")],
    ];
    let success = logger.batch_update("A1:B2", values).await;
    tracing::info!(success, "Batch update completed");
}
