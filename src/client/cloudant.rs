/// CouchDB/Cloudant HTTP client
///
/// Implements `DocumentClient` over the CouchDB HTTP API. Document ids are sent
/// as a single percent-encoded path segment, so ids such as `nodered/lib/flows/a`
/// address one document rather than a nested path.

use crate::client::{ClientResult, DesignDocument, Document, DocumentClient, Revision, ViewRow};
use crate::config::{AuthConfig, ServiceCredentials};
use crate::errors::ClientError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Refresh IAM tokens this long before they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Cached IAM bearer token
#[derive(Debug, Clone)]
struct IamToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    rev: String,
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    rows: Vec<ViewRow>,
}

/// HTTP document client for CouchDB and Cloudant
#[derive(Debug)]
pub struct CloudantClient {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthConfig,
    /// Bearer token for IAM auth, fetched lazily
    token: RwLock<Option<IamToken>>,
}

impl CloudantClient {
    /// Create a client for the service described by `credentials`
    pub fn new(credentials: ServiceCredentials) -> ClientResult<Self> {
        let base_url = Url::parse(&credentials.url)
            .map_err(|e| ClientError::Transport(format!("Invalid service URL '{}': {}", credentials.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Transport(format!("Invalid service URL '{}'", credentials.url)));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            auth: credentials.auth,
            token: RwLock::new(None),
        })
    }

    /// Build a URL from the base plus individually encoded path segments
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Transport("Service URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach credentials to a request
    async fn authorize(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        match &self.auth {
            AuthConfig::None => Ok(request),
            AuthConfig::Basic { username, password } => Ok(request.basic_auth(username, Some(password))),
            AuthConfig::Iam { api_key, token_url } => {
                let token = self.iam_token(api_key, token_url).await?;
                Ok(request.bearer_auth(token))
            }
        }
    }

    /// Current IAM bearer token, exchanging the API key when missing or about to expire
    async fn iam_token(&self, api_key: &str, token_url: &str) -> ClientResult<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        tracing::debug!("🔑 Requesting IAM token from {}", token_url);
        let response = self
            .http
            .post(token_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                ("apikey", api_key),
            ])
            .send()
            .await?;
        let response = check(response).await?;
        let body: IamTokenResponse = response.json().await?;

        let token = IamToken {
            access_token: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in.unwrap_or(3600)),
        };
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }
}

/// Map non-success statuses onto the client error taxonomy
async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(body),
        StatusCode::CONFLICT => ClientError::Conflict(body),
        _ => ClientError::Transport(format!("{}: {}", status, body)),
    })
}

#[async_trait]
impl DocumentClient for CloudantClient {
    async fn get_document(&self, db: &str, id: &str) -> ClientResult<Document> {
        let url = self.url(&[db, id])?;
        tracing::debug!("📄 GET {}", url);

        let request = self.authorize(self.http.get(url)).await?;
        let response = check(request.send().await?).await?;
        let value: Value = response.json().await?;
        Document::from_json(value)
    }

    async fn put_document(
        &self,
        db: &str,
        id: &str,
        body: Map<String, Value>,
        rev: Option<&Revision>,
    ) -> ClientResult<Revision> {
        let url = self.url(&[db, id])?;
        tracing::debug!("📝 PUT {} (rev: {:?})", url, rev.map(Revision::as_str));

        let mut request = self.http.put(url).json(&body);
        if let Some(rev) = rev {
            request = request.query(&[("rev", rev.as_str())]);
        }
        let request = self.authorize(request).await?;
        let response = check(request.send().await?).await?;
        let written: WriteResponse = response.json().await?;
        Ok(Revision::new(written.rev))
    }

    async fn head_database(&self, db: &str) -> ClientResult<()> {
        let url = self.url(&[db])?;
        let request = self.authorize(self.http.head(url)).await?;
        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(format!("database {}", db))),
            status => Err(ClientError::Transport(format!("{}: HEAD database {}", status, db))),
        }
    }

    async fn put_database(&self, db: &str) -> ClientResult<()> {
        let url = self.url(&[db])?;
        let request = self.authorize(self.http.put(url)).await?;
        let response = request.send().await?;
        // 412 means another process created it first
        if response.status() == StatusCode::PRECONDITION_FAILED {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }

    async fn put_design_document(&self, db: &str, ddoc: &str, design: &DesignDocument) -> ClientResult<()> {
        let url = self.url(&[db, "_design", ddoc])?;
        let request = self.authorize(self.http.put(url).json(design)).await?;
        check(request.send().await?).await?;
        Ok(())
    }

    async fn post_view(&self, db: &str, ddoc: &str, view: &str, keys: &[Value]) -> ClientResult<Vec<ViewRow>> {
        let url = self.url(&[db, "_design", ddoc, "_view", view])?;
        let key_list = Value::from(keys.to_vec());
        tracing::debug!("🔎 POST {} keys={}", url, key_list);

        let request = self.authorize(self.http.post(url).json(&json!({ "keys": keys }))).await?;
        let response = check(request.send().await?).await?;
        let result: ViewResponse = response.json().await?;
        Ok(result.rows)
    }
}
