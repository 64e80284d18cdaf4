use std::sync::Arc;
use std::time::Duration;

use crate::config::SheetsConfig;
use crate::errors::{SheetsError, SheetsResult};
use crate::sheets::auth::{ServiceAccountTokens, TokenSource};
use crate::sheets::client::SheetsClient;
use crate::sheets::spreadsheet::Spreadsheet;
use crate::sheets::worksheet::WorksheetHandle;

pub const DEFAULT_WORKSHEET_ROWS: u32 = 1000;
pub const DEFAULT_WORKSHEET_COLS: u32 = 26;

/// Authenticates and resolves worksheet handles.
///
/// Every public operation logs its failure and returns `None`; callers only
/// learn *that* the connection is unavailable.
pub struct SheetsSetup {
    config: SheetsConfig,
    client: Option<Arc<SheetsClient>>,
    spreadsheet: Option<Spreadsheet>,
}

impl SheetsSetup {
    pub fn new(config: SheetsConfig) -> Self {
        Self {
            config,
            client: None,
            spreadsheet: None,
        }
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    pub fn client(&self) -> Option<Arc<SheetsClient>> {
        self.client.clone()
    }

    /// Uses an already-built token source instead of the service account.
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> SheetsResult<Self> {
        self.client = Some(Arc::new(self.build_client(tokens)?));
        Ok(self)
    }

    fn build_client(&self, tokens: Arc<dyn TokenSource>) -> SheetsResult<SheetsClient> {
        SheetsClient::new(
            tokens,
            SheetsClient::api_base_for(self.config.universe_domain()),
            Duration::from_secs(self.config.request_timeout_secs),
        )
    }

    async fn try_setup_connection(&mut self) -> SheetsResult<Arc<SheetsClient>> {
        let tokens = ServiceAccountTokens::from_config(&self.config).await?;
        // Fail here rather than on the first write if the key is rejected.
        tokens.access_token().await?;
        let client = Arc::new(self.build_client(Arc::new(tokens))?);
        self.client = Some(client.clone());
        Ok(client)
    }

    pub async fn setup_connection(&mut self) -> Option<Arc<SheetsClient>> {
        match self.try_setup_connection().await {
            Ok(client) => {
                tracing::info!("Google Sheets API successfully configured");
                Some(client)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error while setting up Google Sheets API");
                None
            }
        }
    }

    async fn try_connect(&mut self, spreadsheet_id: Option<&str>) -> SheetsResult<Arc<WorksheetHandle>> {
        let sheet_id = spreadsheet_id
            .filter(|id| !id.is_empty())
            .or(self.config.spreadsheet_id.as_deref())
            .map(str::to_string)
            .ok_or_else(|| {
                SheetsError::Config("No spreadsheet ID provided or found in environment".into())
            })?;
        let client = self
            .client
            .clone()
            .ok_or_else(|| SheetsError::NotConnected("call setup_connection first".into()))?;

        let spreadsheet = Spreadsheet::open(client, &sheet_id).await?;
        let worksheet = Arc::new(spreadsheet.sheet1()?);
        self.spreadsheet = Some(spreadsheet);
        tracing::info!(spreadsheet = %sheet_id, worksheet = %worksheet.properties().title, "Successfully connected to spreadsheet");
        Ok(worksheet)
    }

    /// Opens the spreadsheet (argument, else configured id) and returns its first tab.
    pub async fn connect_to_spreadsheet(
        &mut self,
        spreadsheet_id: Option<&str>,
    ) -> Option<Arc<WorksheetHandle>> {
        match self.try_connect(spreadsheet_id).await {
            Ok(worksheet) => Some(worksheet),
            Err(e) => {
                tracing::error!(error = %e, "Error connecting to spreadsheet");
                None
            }
        }
    }

    /// Adds a tab to the connected spreadsheet.
    pub async fn create_worksheet(
        &mut self,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Option<Arc<WorksheetHandle>> {
        let Some(spreadsheet) = self.spreadsheet.as_mut() else {
            tracing::error!("No spreadsheet connected");
            return None;
        };
        match spreadsheet.add_worksheet(title, rows, cols).await {
            Ok(worksheet) => {
                tracing::info!(title, rows, cols, "Successfully created worksheet");
                Some(Arc::new(worksheet))
            }
            Err(e) => {
                tracing::error!(error = %e, title, "Error creating worksheet");
                None
            }
        }
    }
}

/// Builds a setup from `config` and returns its authenticated client.
pub async fn get_sheets_client(config: SheetsConfig) -> Option<Arc<SheetsClient>> {
    SheetsSetup::new(config).setup_connection().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceAccountConfig;
    use crate::sheets::auth::StaticToken;

    #[tokio::test]
    async fn setup_without_credentials_returns_none() {
        let mut setup = SheetsSetup::new(SheetsConfig {
            credentials: ServiceAccountConfig::default(),
            ..SheetsConfig::default()
        });
        assert!(setup.setup_connection().await.is_none());
        assert!(setup.client().is_none());
    }

    #[tokio::test]
    async fn connect_without_spreadsheet_id_returns_none() {
        let mut setup = SheetsSetup::new(SheetsConfig::default())
            .with_token_source(Arc::new(StaticToken::new("t")))
            .unwrap();
        assert!(setup.client().is_some());
        assert!(setup.connect_to_spreadsheet(None).await.is_none());
        assert!(setup.connect_to_spreadsheet(Some("")).await.is_none());
    }

    #[tokio::test]
    async fn connect_without_client_returns_none() {
        let mut setup = SheetsSetup::new(SheetsConfig {
            spreadsheet_id: Some("abc".into()),
            ..SheetsConfig::default()
        });
        assert!(setup.connect_to_spreadsheet(None).await.is_none());
    }

    #[tokio::test]
    async fn create_worksheet_requires_connected_spreadsheet() {
        let mut setup = SheetsSetup::new(SheetsConfig::default());
        assert!(setup
            .create_worksheet("Ratings", DEFAULT_WORKSHEET_ROWS, DEFAULT_WORKSHEET_COLS)
            .await
            .is_none());
    }
}
