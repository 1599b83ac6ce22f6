use async_trait::async_trait;
use reqwest::{Client, Method};
use shared::protocol::{Action, ActionRequest, ActionResponse, QueryBody};
use tracing::{error, info, warn};
use url::Url;

pub mod error;
pub use error::{RelayError, START_SERVER_HINT};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// The single HTTP call an action resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    pub url: Url,
    pub body: Option<QueryBody>,
}

/// Maps an action onto its fixed route under `base_url`.
///
/// Parameters are form-urlencoded; missing `graph`/`query` values are sent as
/// empty strings and left for the server to reject.
pub fn endpoint(
    base_url: &str,
    action: Action,
    request: &ActionRequest,
) -> Result<Endpoint, RelayError> {
    let graph = request.graph.as_deref().unwrap_or_default();
    let query = request.query.as_deref().unwrap_or_default();

    let (method, path, params, body) = match action {
        Action::Health => (Method::GET, "/health", Vec::new(), None),
        Action::ListGraphs => (Method::GET, "/list", Vec::new(), None),
        Action::ShowGraph => (Method::GET, "/show", vec![("graph", graph)], None),
        Action::Search => {
            let mut params = vec![("q", query)];
            if !graph.is_empty() {
                params.push(("graph", graph));
            }
            (Method::GET, "/search", params, None)
        }
        Action::Query => (
            Method::POST,
            "/query",
            Vec::new(),
            Some(QueryBody {
                graph: graph.to_string(),
                query: query.to_string(),
            }),
        ),
    };

    let mut url = Url::parse(&format!("{}{path}", base_url.trim_end_matches('/')))?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }

    Ok(Endpoint { method, url, body })
}

/// Asynchronous seam between the presenter and whatever owns network access.
#[async_trait]
pub trait RelayHandle: Send + Sync {
    async fn send(&self, request: ActionRequest) -> Result<ActionResponse, RelayError>;
}

pub struct Relay {
    http: Client,
    base_url: String,
}

impl Relay {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forwards one action to the server. Unknown action names are answered
    /// locally and never reach the network.
    pub async fn dispatch(&self, request: &ActionRequest) -> Result<ActionResponse, RelayError> {
        let action = match request.kind() {
            Ok(action) => action,
            Err(unknown) => {
                warn!(action = %unknown.0, "rejecting unknown action");
                return Ok(ActionResponse::unknown_action());
            }
        };
        let endpoint = endpoint(&self.base_url, action, request)?;
        self.call(endpoint).await
    }

    /// Message-handler surface: every failure is folded into
    /// `{success: false, error}`.
    pub async fn handle(&self, request: &ActionRequest) -> ActionResponse {
        info!(
            action = %request.action,
            graph = ?request.graph,
            query = ?request.query,
            "received action request"
        );
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(error) => ActionResponse::failure(error.to_string()),
        }
    }

    async fn call(&self, endpoint: Endpoint) -> Result<ActionResponse, RelayError> {
        let Endpoint { method, url, body } = endpoint;
        let result = self.send_http(method.clone(), url.clone(), body).await;
        if let Err(error) = &result {
            error!(%method, %url, %error, "api call failed");
        }
        result
    }

    async fn send_http(
        &self,
        method: Method,
        url: Url,
        body: Option<QueryBody>,
    ) -> Result<ActionResponse, RelayError> {
        let mut builder = self.http.request(method, url);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response.json::<ActionResponse>().await?)
    }
}

#[async_trait]
impl RelayHandle for Relay {
    async fn send(&self, request: ActionRequest) -> Result<ActionResponse, RelayError> {
        Ok(self.handle(&request).await)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
