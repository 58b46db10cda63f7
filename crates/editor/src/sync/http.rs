use shared::Action;
use tokio::sync::mpsc;

use super::{SyncClient, SyncReply, Ticket};
use crate::error::SyncError;

/// Posts actions as JSON to a single endpoint on a background runtime
pub struct HttpSyncClient {
    endpoint: String,
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    tx: mpsc::UnboundedSender<SyncReply>,
    rx: mpsc::UnboundedReceiver<SyncReply>,
}

impl HttpSyncClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SyncError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("cell-editor-sync")
            .enable_all()
            .build()
            .map_err(|e| SyncError::Runtime(e.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
            runtime,
            tx,
            rx,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

async fn post(
    http: &reqwest::Client,
    endpoint: &str,
    action: &Action,
) -> Result<serde_json::Value, SyncError> {
    let response = http
        .post(endpoint)
        .json(action)
        .send()
        .await
        .map_err(|e| SyncError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::Status(status.as_u16()));
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| SyncError::Decode(e.to_string()))
}

impl SyncClient for HttpSyncClient {
    fn send(&mut self, action: Action) -> Ticket {
        let ticket = Ticket::new();
        let kind = action.kind();
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let tx = self.tx.clone();

        tracing::debug!("Sending {kind} ({ticket})");
        self.runtime.spawn(async move {
            let result = post(&http, &endpoint, &action).await;
            match &result {
                Ok(body) => tracing::debug!("Service response for {kind}: {body}"),
                Err(e) => tracing::error!("Request {kind} ({ticket}) failed: {e}"),
            }
            // Receiver is gone only when the client was dropped
            let _ = tx.send(SyncReply {
                ticket,
                action: kind,
                result,
            });
        });

        ticket
    }

    fn poll(&mut self) -> Vec<SyncReply> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.rx.try_recv() {
            replies.push(reply);
        }
        replies
    }
}
