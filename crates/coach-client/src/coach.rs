//! Debounced, cached access to `/analyze` for interactive move navigation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use analysis_engine::BoundedCache;
use futures::FutureExt;

use crate::api::{AnalyzeRequest, AnalyzeResponse, ClientError, CoachClient};
use crate::debounce::{lock, DebounceHandle, Debounced, Debouncer, DEFAULT_DELAY};

/// Responses kept for revisited moves
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

type Responses = Arc<Mutex<BoundedCache<AnalyzeRequest, AnalyzeResponse>>>;

/// Rapid requests collapse into the last one. Successful responses are kept
/// in a small LRU so revisiting a move answers immediately.
pub struct DebouncedCoach {
    debouncer: Debouncer<AnalyzeRequest, Result<AnalyzeResponse, ClientError>>,
    responses: Responses,
}

impl DebouncedCoach {
    pub fn new(client: CoachClient) -> Self {
        Self::with_delay(client, DEFAULT_DELAY)
    }

    pub fn with_delay(client: CoachClient, delay: Duration) -> Self {
        Self::with_limits(client, delay, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_limits(client: CoachClient, delay: Duration, capacity: usize) -> Self {
        let responses: Responses = Arc::new(Mutex::new(BoundedCache::new(capacity, None)));
        let store = Arc::clone(&responses);
        let debouncer = Debouncer::new(delay, move |request: AnalyzeRequest| {
            let client = client.clone();
            let store = Arc::clone(&store);
            async move {
                let response = client.analyze(&request).await?;
                remember(&store, request, response.clone());
                Ok::<_, ClientError>(response)
            }
            .boxed()
        });
        Self {
            debouncer,
            responses,
        }
    }

    fn cached(&self, request: &AnalyzeRequest) -> Option<AnalyzeResponse> {
        lock(&self.responses).get(request)
    }

    /// Request analysis. A cached response settles at once and supersedes
    /// whatever was waiting.
    pub async fn analyze(&self, request: AnalyzeRequest) -> Debounced<Result<AnalyzeResponse, ClientError>> {
        if let Some(response) = self.cached(&request) {
            self.debouncer.cancel();
            return Debounced::Completed(Ok(response));
        }
        self.schedule(request).await
    }

    /// Schedule without waiting, for callers that hold several handles.
    pub fn schedule(
        &self,
        request: AnalyzeRequest,
    ) -> DebounceHandle<Result<AnalyzeResponse, ClientError>> {
        self.debouncer.schedule(request)
    }
}

fn remember(store: &Responses, request: AnalyzeRequest, response: AnalyzeResponse) {
    lock(store).insert(request, response);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coach(capacity: usize) -> DebouncedCoach {
        let client = CoachClient::new("http://127.0.0.1:9").unwrap();
        DebouncedCoach::with_limits(client, Duration::from_millis(10), capacity)
    }

    fn request(move_index: i64) -> AnalyzeRequest {
        AnalyzeRequest {
            pgn: "1. e4 e5 2. Nf3".to_string(),
            move_index,
            user_color: None,
            actual_move: None,
        }
    }

    fn response(fen: &str) -> AnalyzeResponse {
        serde_json::from_value(json!({
            "input": { "pgn": "1. e4 e5 2. Nf3", "fen": fen },
            "stockfish": { "bestMove": "Nf3", "eval": 0.2, "depth": 12 },
            "advice": null,
            "adviceStatus": "unavailable"
        }))
        .unwrap()
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let coach = coach(2);
        remember(&coach.responses, request(1), response("one"));
        remember(&coach.responses, request(2), response("two"));
        remember(&coach.responses, request(3), response("three"));

        assert_eq!(lock(&coach.responses).len(), 2);
        assert_eq!(coach.cached(&request(1)), None);
        assert_eq!(coach.cached(&request(2)).unwrap().input.fen, "two");
        assert_eq!(coach.cached(&request(3)).unwrap().input.fen, "three");
    }

    #[test]
    fn test_revisited_response_survives_eviction() {
        let coach = coach(2);
        remember(&coach.responses, request(1), response("one"));
        remember(&coach.responses, request(2), response("two"));
        assert!(coach.cached(&request(1)).is_some());
        remember(&coach.responses, request(3), response("three"));

        assert!(coach.cached(&request(1)).is_some());
        assert_eq!(coach.cached(&request(2)), None);
    }

    #[tokio::test]
    async fn test_cached_response_settles_without_request() {
        let coach = coach(4);
        remember(&coach.responses, request(2), response("two"));

        // The base URL is unreachable, so a network call would fail
        match coach.analyze(request(2)).await {
            Debounced::Completed(Ok(r)) => assert_eq!(r.input.fen, "two"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_poisoned_store_keeps_caching() {
        let coach = coach(4);
        let store = Arc::clone(&coach.responses);
        let _ = std::thread::spawn(move || {
            let _guard = store.lock().unwrap();
            panic!("poison the store");
        })
        .join();
        assert!(coach.responses.is_poisoned());

        remember(&coach.responses, request(1), response("one"));
        assert_eq!(coach.cached(&request(1)).unwrap().input.fen, "one");
    }
}
