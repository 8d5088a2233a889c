//! External collaborators: the counts-by-location service and the
//! deduplicated-count service.
//!
//! Both traits return boxed `'static` futures so implementations stay
//! dyn-compatible and a dedup call can be shared between waiters.

use aggregate::observation::{CountsResponse, Observation};
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::protocol::{CountsQuery, DedupRequest, DedupResponse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(String),
    /// Non-success status; displays as the response body.
    #[error("{body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("response carried no total")]
    MissingTotal,
}

pub trait DedupService: Send + Sync {
    fn count(&self, request: DedupRequest) -> BoxFuture<'static, Result<DedupResponse, ServiceError>>;
}

pub trait CountsSource: Send + Sync {
    fn fetch(&self, query: CountsQuery) -> BoxFuture<'static, Result<Vec<Observation>, ServiceError>>;
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

/// `POST {base}/cluster-count`.
#[derive(Debug, Clone)]
pub struct HttpDedupService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDedupService {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: join_url(base_url, "cluster-count"),
        }
    }
}

impl DedupService for HttpDedupService {
    fn count(&self, request: DedupRequest) -> BoxFuture<'static, Result<DedupResponse, ServiceError>> {
        let client = self.client.clone();
        let url = self.endpoint.clone();
        Box::pin(async move {
            let resp = client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| ServiceError::Transport(e.to_string()))?;
            let resp = check_status(resp).await?;
            resp.json::<DedupResponse>()
                .await
                .map_err(|e| ServiceError::Decode(e.to_string()))
        })
    }
}

/// `GET {base}/heatmap?query=..&seniority=..&min_total=..&limit=..`.
#[derive(Debug, Clone)]
pub struct HttpCountsSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCountsSource {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: join_url(base_url, "heatmap"),
        }
    }
}

impl CountsSource for HttpCountsSource {
    fn fetch(&self, query: CountsQuery) -> BoxFuture<'static, Result<Vec<Observation>, ServiceError>> {
        let client = self.client.clone();
        let url = self.endpoint.clone();
        Box::pin(async move {
            let resp = client
                .get(&url)
                .query(&query.to_params())
                .send()
                .await
                .map_err(|e| ServiceError::Transport(e.to_string()))?;
            let resp = check_status(resp).await?;
            let body = resp
                .json::<CountsResponse>()
                .await
                .map_err(|e| ServiceError::Decode(e.to_string()))?;
            Ok(body.points)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ServiceError, join_url};

    #[test]
    fn status_error_displays_body() {
        let err = ServiceError::Status {
            status: 500,
            body: "upstream timeout".into(),
        };
        assert_eq!(err.to_string(), "upstream timeout");
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        assert_eq!(join_url("http://localhost:8000/", "heatmap"), "http://localhost:8000/heatmap");
        assert_eq!(join_url("http://localhost:8000", "cluster-count"), "http://localhost:8000/cluster-count");
    }
}
