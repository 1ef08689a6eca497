use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use ddg_search::data_models::{SearchRequest, SearchResult};
use ddg_search::error::SearchError;
use ddg_search::relay::{BusError, ChannelBus, MessageBus, RuntimeMessage, web_search};

mod test_helpers {
    use super::*;

    pub fn fixed_results() -> Vec<SearchResult> {
        vec![
            SearchResult::new(
                "Tokio".into(),
                "An asynchronous runtime".into(),
                "https://tokio.rs/".into(),
            ),
            SearchResult::new("".into(), "".into(), "".into()),
            SearchResult::new(
                "Tokio".into(),
                "An asynchronous runtime".into(),
                "https://tokio.rs/".into(),
            ),
        ]
    }

    /// Echoes a fixed reply and remembers what it was sent.
    pub struct EchoBus {
        pub reply: Vec<SearchResult>,
        pub seen: Mutex<Vec<RuntimeMessage>>,
    }

    #[async_trait]
    impl MessageBus for EchoBus {
        type Error = BusError;

        async fn send_message(
            &self,
            message: RuntimeMessage,
        ) -> Result<Vec<SearchResult>, BusError> {
            self.seen.lock().unwrap().push(message);
            Ok(self.reply.clone())
        }
    }

    pub struct DeadBus;

    #[async_trait]
    impl MessageBus for DeadBus {
        type Error = std::io::Error;

        async fn send_message(
            &self,
            _message: RuntimeMessage,
        ) -> Result<Vec<SearchResult>, std::io::Error> {
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "no background page",
            ))
        }
    }

    pub fn request() -> SearchRequest {
        SearchRequest {
            query: "tokio runtime".to_string(),
            timerange: "m".to_string(),
            region: "us-en".to_string(),
        }
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_web_search_returns_reply_unchanged() -> Result<()> {
    let bus = EchoBus {
        reply: fixed_results(),
        seen: Mutex::new(Vec::new()),
    };

    let results = web_search(&bus, request(), 3).await?;
    assert_eq!(results, fixed_results());

    let seen = bus.seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![RuntimeMessage::GetSearchResults {
            search: request(),
            num_results: 3,
        }]
    );
    Ok(())
}

#[tokio::test]
async fn test_web_search_trusts_reply_length() -> Result<()> {
    let bus = EchoBus {
        reply: fixed_results(),
        seen: Mutex::new(Vec::new()),
    };

    // The responder owns the cap, nothing is trimmed locally.
    let results = web_search(&bus, request(), 1).await?;
    assert_eq!(results.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_web_search_propagates_transport_error() {
    let err = web_search(&DeadBus, request(), 3).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::ConnectionRefused);
    assert_eq!(err.to_string(), "no background page");
}

#[tokio::test]
async fn test_web_search_through_dyn_bus() -> Result<()> {
    let bus = EchoBus {
        reply: fixed_results(),
        seen: Mutex::new(Vec::new()),
    };
    let bus: &dyn MessageBus<Error = BusError> = &bus;

    assert_eq!(web_search(bus, request(), 3).await?, fixed_results());
    Ok(())
}

#[tokio::test]
async fn test_channel_bus_round_trip() -> Result<()> {
    let (bus, listener) = ChannelBus::new(4);
    let handle = tokio::spawn(listener.serve(|message| async move {
        match message {
            RuntimeMessage::GetSearchResults {
                search,
                num_results,
            } => Ok::<_, SearchError>(
                (0..num_results)
                    .map(|i| {
                        SearchResult::new(
                            format!("{} #{i}", search.query),
                            search.region.clone(),
                            format!("https://example.com/{i}"),
                        )
                    })
                    .collect::<Vec<SearchResult>>(),
            ),
        }
    }));

    let results = web_search(&bus, request(), 2).await?;
    assert_eq!(
        results,
        vec![
            SearchResult::new(
                "tokio runtime #0".into(),
                "us-en".into(),
                "https://example.com/0".into()
            ),
            SearchResult::new(
                "tokio runtime #1".into(),
                "us-en".into(),
                "https://example.com/1".into()
            ),
        ]
    );

    // Listener exits once every sender is gone.
    drop(bus);
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn test_channel_bus_without_listener() {
    let (bus, listener) = ChannelBus::new(1);
    drop(listener);

    let err = web_search(&bus, request(), 3).await.unwrap_err();
    assert_eq!(err, BusError::NoResponder);
}

#[tokio::test]
async fn test_channel_bus_reply_dropped() -> Result<()> {
    let (bus, mut listener) = ChannelBus::new(1);
    let handle = tokio::spawn(async move {
        let incoming = listener.recv().await.expect("one message");
        assert!(matches!(
            incoming.message,
            RuntimeMessage::GetSearchResults { num_results: 5, .. }
        ));
        drop(incoming);
    });

    let err = web_search(&bus, request(), 5).await.unwrap_err();
    assert_eq!(err, BusError::ReplyDropped);
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn test_channel_bus_handler_failure_reaches_sender() -> Result<()> {
    let (bus, listener) = ChannelBus::new(1);
    let handle = tokio::spawn(listener.serve(|_message| async {
        Err::<Vec<SearchResult>, _>(SearchError::Fetch {
            status: 503,
            status_text: "Service Unavailable".to_string(),
        })
    }));

    let err = web_search(&bus, request(), 3).await.unwrap_err();
    assert_eq!(
        err,
        BusError::Responder("Failed to fetch: 503 Service Unavailable".to_string())
    );
    assert!(err.to_string().contains("503"));

    drop(bus);
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn test_incoming_message_fail() -> Result<()> {
    let (bus, mut listener) = ChannelBus::new(1);
    let handle = tokio::spawn(async move {
        let incoming = listener.recv().await.expect("one message");
        assert!(incoming.fail("backend down"));
    });

    let err = web_search(&bus, request(), 3).await.unwrap_err();
    assert_eq!(err, BusError::Responder("backend down".to_string()));
    handle.await?;
    Ok(())
}
