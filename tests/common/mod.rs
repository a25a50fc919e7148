#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use adinsights::config::ApiConfig;
use adinsights::errors::TransportError;
use adinsights::external::graph_transport::{GraphReply, GraphTransport};
use adinsights::external::marketing_api::MarketingApiClient;
use async_trait::async_trait;

pub type Query = Vec<(&'static str, String)>;
pub type RequestLog = Arc<Mutex<Vec<(String, Query)>>>;

/// Serves canned replies in order and remembers what was asked for.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<GraphReply>>,
    log: RequestLog,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<(u16, String)>) -> (Self, RequestLog) {
        let log = RequestLog::default();
        let replies = replies
            .into_iter()
            .map(|(status, body)| GraphReply { status, body })
            .collect();
        (
            Self {
                replies: Mutex::new(replies),
                log: log.clone(),
            },
            log,
        )
    }
}

#[async_trait]
impl GraphTransport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<GraphReply, TransportError> {
        self.log.lock().unwrap().push((url.to_string(), query.to_vec()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Network("connection refused".to_string()))
    }
}

pub fn scripted_client(replies: Vec<(u16, String)>) -> (MarketingApiClient, RequestLog) {
    let (transport, log) = ScriptedTransport::new(replies);
    let config = ApiConfig::new("test-token", "act_1001");
    (MarketingApiClient::with_transport(config, Box::new(transport)), log)
}
