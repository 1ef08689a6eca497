use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::{mpsc, oneshot};

use crate::data_models::{SearchRequest, SearchResult};

/// Messages understood by the background router.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeMessage {
    GetSearchResults {
        search: SearchRequest,
        num_results: usize,
    },
}

/// Transport to whatever answers search requests on the other side.
/// The reply is trusted as-is.
#[async_trait]
pub trait MessageBus: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn send_message(&self, message: RuntimeMessage) -> Result<Vec<SearchResult>, Self::Error>;
}

/// Delegate a search to the background router. Transport failures are
/// returned untouched.
pub async fn web_search<B>(
    bus: &B,
    search: SearchRequest,
    num_results: usize,
) -> Result<Vec<SearchResult>, B::Error>
where
    B: MessageBus + ?Sized,
{
    log::debug!("relaying search {:?} ({num_results} results)", search.query);
    bus.send_message(RuntimeMessage::GetSearchResults {
        search,
        num_results,
    })
    .await
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BusError {
    #[error("could not establish connection: receiving end does not exist")]
    NoResponder,
    #[error("message channel closed before a response was received")]
    ReplyDropped,
    /// The listener handled the message but answered with a failure.
    #[error("responder failed: {0}")]
    Responder(String),
}

type Reply = Result<Vec<SearchResult>, String>;

/// A message waiting for an answer on the listener side.
#[derive(Debug)]
pub struct IncomingMessage {
    pub message: RuntimeMessage,
    reply_tx: oneshot::Sender<Reply>,
}

impl IncomingMessage {
    /// Answer the sender. Returns false when the sender stopped waiting.
    pub fn reply(self, results: Vec<SearchResult>) -> bool {
        self.reply_tx.send(Ok(results)).is_ok()
    }

    /// Reject the message; the sender sees `BusError::Responder(reason)`.
    pub fn fail(self, reason: impl Into<String>) -> bool {
        self.reply_tx.send(Err(reason.into())).is_ok()
    }
}

/// In-process bus: the sending half is cheap to clone, the listener is
/// drained by a single background task.
#[derive(Debug, Clone)]
pub struct ChannelBus {
    tx: mpsc::Sender<IncomingMessage>,
}

#[derive(Debug)]
pub struct BusListener {
    rx: mpsc::Receiver<IncomingMessage>,
}

impl ChannelBus {
    pub fn new(buffer: usize) -> (ChannelBus, BusListener) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (ChannelBus { tx }, BusListener { rx })
    }
}

#[async_trait]
impl MessageBus for ChannelBus {
    type Error = BusError;

    async fn send_message(&self, message: RuntimeMessage) -> Result<Vec<SearchResult>, BusError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(IncomingMessage { message, reply_tx })
            .await
            .map_err(|_| BusError::NoResponder)?;
        reply_rx
            .await
            .map_err(|_| BusError::ReplyDropped)?
            .map_err(BusError::Responder)
    }
}

impl BusListener {
    pub async fn recv(&mut self) -> Option<IncomingMessage> {
        self.rx.recv().await
    }

    /// Answer every incoming message with `handler` until all senders are gone.
    /// Handler errors are sent back to the caller as `BusError::Responder`.
    pub async fn serve<F, Fut, E>(mut self, handler: F)
    where
        F: Fn(RuntimeMessage) -> Fut,
        Fut: Future<Output = Result<Vec<SearchResult>, E>>,
        E: std::fmt::Display,
    {
        while let Some(incoming) = self.recv().await {
            let delivered = match handler(incoming.message.clone()).await {
                Ok(results) => incoming.reply(results),
                Err(e) => {
                    log::warn!("search handler failed: {e}");
                    incoming.fail(e.to_string())
                }
            };
            if !delivered {
                log::warn!("sender went away before the reply was delivered");
            }
        }
        log::debug!("bus listener stopped, no senders left");
    }
}

#[test]
fn test_message_shape() {
    let msg = RuntimeMessage::GetSearchResults {
        search: SearchRequest::new("tokio"),
        num_results: 3,
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "type": "get_search_results",
            "search": {"query": "tokio", "timerange": "", "region": ""},
            "num_results": 3
        })
    );
}
