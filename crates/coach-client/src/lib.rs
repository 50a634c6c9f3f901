//! Client side of the coaching service: a typed HTTP client and a debouncer
//! that collapses bursts of requests into one.

pub mod api;
pub mod coach;
pub mod debounce;

pub use api::{AnalyzeRequest, AnalyzeResponse, ClientError, CoachClient, PreloadResponse};
pub use coach::{DebouncedCoach, DEFAULT_CACHE_CAPACITY};
pub use debounce::{DebounceHandle, Debounced, Debouncer, DEFAULT_DELAY};
