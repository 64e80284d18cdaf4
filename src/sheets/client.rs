use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

use crate::errors::{SheetsError, SheetsResult};
use crate::sheets::auth::TokenSource;

/// A Sheets API call, described independently of how it is sent.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path segments below the API base, e.g. `["spreadsheets", id]`.
    pub segments: Vec<String>,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, segments: Vec<String>) -> Self {
        Self {
            method,
            segments,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Resolves the full URL against `api_base`, percent-encoding each segment.
    pub fn url(&self, api_base: &str) -> SheetsResult<Url> {
        let mut url = Url::parse(api_base)
            .map_err(|e| SheetsError::Config(format!("invalid API base '{api_base}': {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Config(format!("API base '{api_base}' cannot hold a path")))?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Authenticated client for the Sheets v4 REST API.
pub struct SheetsClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    api_base: String,
}

impl SheetsClient {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        api_base: String,
        timeout: Duration,
    ) -> SheetsResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            tokens,
            api_base,
        })
    }

    /// API base for a universe domain, `https://sheets.googleapis.com/v4` by default.
    pub fn api_base_for(universe_domain: &str) -> String {
        format!("https://sheets.{universe_domain}/v4")
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub async fn send(&self, request: ApiRequest) -> SheetsResult<serde_json::Value> {
        let url = request.url(&self.api_base)?;
        let token = self.tokens.access_token().await?;

        tracing::debug!(method = %request.method, url = %url, "sending Sheets request");

        let mut builder = self.http.request(request.method.clone(), url).bearer_auth(token);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &err_body));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> SheetsResult<T> {
        let value = self.send(request).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Builds an `Api` error, preferring the message inside Google's error envelope.
pub fn api_error(status: u16, body: &str) -> SheetsError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    SheetsError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::sheets::auth::StaticToken;

    /// Serves one canned HTTP response and hands back the raw request it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/v4", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (base, handle)
    }

    fn client(base: String) -> SheetsClient {
        SheetsClient::new(Arc::new(StaticToken::new("t")), base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn send_attaches_token_and_parses_json() {
        let (base, server) = serve_once("200 OK", r#"{"updatedRange":"Sheet1!A2:E2"}"#).await;
        let request = ApiRequest::new(Method::POST, vec!["spreadsheets".into(), "abc".into()])
            .query("valueInputOption", "RAW")
            .body(serde_json::json!({ "values": [["a", 1]] }));

        let value = client(base).send(request).await.unwrap();
        assert_eq!(value["updatedRange"], "Sheet1!A2:E2");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v4/spreadsheets/abc?valueInputOption=RAW HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer t"));
        assert!(raw.ends_with(r#"{"values":[["a",1]]}"#));
    }

    #[tokio::test]
    async fn send_maps_error_status_to_api_error() {
        let (base, server) = serve_once(
            "429 Too Many Requests",
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .await;
        let request = ApiRequest::new(Method::GET, vec!["spreadsheets".into(), "abc".into()]);

        let err = client(base).send(request).await.unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(
            err,
            SheetsError::Api { status: 429, ref message } if message == "Quota exceeded"
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn send_treats_empty_body_as_null() {
        let (base, server) = serve_once("200 OK", "").await;
        let request = ApiRequest::new(Method::GET, vec!["spreadsheets".into(), "abc".into()]);

        let value = client(base).send(request).await.unwrap();
        assert!(value.is_null());
        server.await.unwrap();
    }

    #[test]
    fn url_encodes_segments_and_query() {
        let request = ApiRequest::new(
            Method::POST,
            vec![
                "spreadsheets".into(),
                "abc".into(),
                "values".into(),
                "'My Log'!A1:append".into(),
            ],
        )
        .query("valueInputOption", "RAW");

        let url = request.url("https://sheets.googleapis.com/v4").unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc/values/"));
        assert!(url.path().ends_with("My%20Log'!A1:append"));
        assert_eq!(url.query(), Some("valueInputOption=RAW"));
    }

    #[test]
    fn api_base_follows_universe_domain() {
        assert_eq!(
            SheetsClient::api_base_for("googleapis.com"),
            "https://sheets.googleapis.com/v4"
        );
    }

    #[test]
    fn api_error_reads_google_envelope() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        match api_error(429, body) {
            SheetsError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = api_error(503, " upstream unavailable \n");
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Sheets API error (503): upstream unavailable");
    }
}
