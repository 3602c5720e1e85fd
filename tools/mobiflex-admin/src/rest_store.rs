//! Native REST client for the hosted catalog store.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use mobiflex_common::config::StoreConfig;
use mobiflex_common::product::{ProductId, ProductRecord};
use mobiflex_common::store::{parse_push_response, CatalogStore, StoreError};
use mobiflex_common::stream::{SseDecoder, StreamEvent};

pub struct RestStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open the live products stream.
    pub async fn subscribe(&self) -> Result<Subscription, StoreError> {
        let url = self.config.products_url();
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!(%url, "catalog stream opened");

        let (tx, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut body = resp.bytes_stream();
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(StoreError::Unreachable(e.to_string())));
                        return;
                    }
                };
                for frame in decoder.feed(&bytes) {
                    let event = frame
                        .into_event()
                        .map_err(|e| StoreError::Decode(e.to_string()));
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
            tracing::info!("catalog stream closed by store");
        });

        Ok(Subscription { events, task })
    }
}

/// Live stream handle. Dropping it closes the connection.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<Result<StreamEvent, StoreError>>,
    task: JoinHandle<()>,
}

impl Stream for Subscription {
    type Item = Result<StreamEvent, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn read_body(resp: reqwest::Response) -> Result<String, StoreError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| StoreError::Unreachable(e.to_string()))?;
    if !status.is_success() {
        return Err(StoreError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

impl CatalogStore for RestStore {
    async fn fetch_snapshot(&self) -> Result<Value, StoreError> {
        let resp = self
            .client
            .get(self.config.products_url())
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;
        let body = read_body(resp).await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn append(&self, record: &ProductRecord) -> Result<ProductId, StoreError> {
        let resp = self
            .client
            .post(self.config.products_url())
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;
        let body = read_body(resp).await?;
        parse_push_response(&body)
    }

    fn store_name(&self) -> &str {
        "firebase-rest"
    }
}
