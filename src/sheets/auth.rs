use async_trait::async_trait;
use yup_oauth2::authenticator::{Authenticator, DefaultHyperClient, HyperClientBuilder};
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use crate::config::{ServiceAccountConfig, SheetsConfig};
use crate::errors::{SheetsError, SheetsResult};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

type DefaultConnector = <DefaultHyperClient as HyperClientBuilder>::Connector;

/// Supplies bearer tokens for Sheets API requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> SheetsResult<String>;
}

/// A fixed token, for emulators and pre-issued credentials.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> SheetsResult<String> {
        Ok(self.0.clone())
    }
}

/// Service-account tokens, minted and cached by `yup-oauth2`.
pub struct ServiceAccountTokens {
    authenticator: Authenticator<DefaultConnector>,
    scopes: Vec<String>,
}

impl ServiceAccountTokens {
    pub async fn from_config(config: &SheetsConfig) -> SheetsResult<Self> {
        let key = service_account_key(&config.credentials)?;
        let authenticator = ServiceAccountAuthenticator::builder(key).build().await?;
        Ok(Self {
            authenticator,
            scopes: config.effective_scopes(),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> SheetsResult<String> {
        let token = self.authenticator.token(self.scopes.as_slice()).await?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| SheetsError::Auth("token response carried no access token".into()))
    }
}

/// Assembles the service-account key from the configured fields.
pub fn service_account_key(creds: &ServiceAccountConfig) -> SheetsResult<ServiceAccountKey> {
    let private_key = creds
        .private_key
        .as_deref()
        .ok_or_else(|| SheetsError::Config("GOOGLE_PRIVATE_KEY is not set".into()))?;
    let client_email = creds
        .client_email
        .as_deref()
        .ok_or_else(|| SheetsError::Config("GOOGLE_CLIENT_EMAIL is not set".into()))?;

    // Keys pasted into .env files usually carry escaped newlines.
    let private_key = private_key.replace("\\n", "\n");

    let json = serde_json::json!({
        "type": creds.account_type,
        "project_id": creds.project_id,
        "private_key_id": creds.private_key_id,
        "private_key": private_key,
        "client_email": client_email,
        "client_id": creds.client_id,
        "auth_uri": creds.auth_uri,
        "token_uri": creds.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI),
        "auth_provider_x509_cert_url": creds.auth_provider_x509_cert_url,
        "client_x509_cert_url": creds.client_x509_cert_url,
    });
    let key = yup_oauth2::parse_service_account_key(serde_json::to_vec(&json)?)?;
    Ok(key)
}
