use std::time::Duration;

use async_trait::async_trait;

use crate::errors::TransportError;

/// Raw answer of a GET: status code and the undecoded body.
#[derive(Debug, Clone)]
pub struct GraphReply {
    pub status: u16,
    pub body: String,
}

impl GraphReply {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// The only I/O the marketing client performs.
///
/// `query` is appended to `url`; an empty slice sends `url` untouched, which
/// is how opaque `paging.next` cursors are followed.
#[async_trait]
pub trait GraphTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<GraphReply, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

const USER_AGENT: &str = "adinsights/0.1";

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = build_client(timeout, USER_AGENT).unwrap_or_else(|e| {
            tracing::warn!(
                "HTTP client setup failed ({}); using library defaults without the {:?} timeout",
                e,
                timeout
            );
            reqwest::Client::new()
        });
        Self { client }
    }
}

fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}

#[async_trait]
impl GraphTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<GraphReply, TransportError> {
        let url = reqwest::Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(GraphReply { status, body })
    }
}
