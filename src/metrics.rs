use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, register_counter, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_generate_requests_total", "Total number of generation requests").unwrap();
    pub static ref CHAT_REQUEST_TOTAL: Counter =
        register_counter!("gateway_chat_requests_total", "Total number of chat proxy requests").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("gateway_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("gateway_cache_misses_total", "Total cache misses").unwrap();
    pub static ref CACHE_WRITE_FAILURES: Counter =
        register_counter!("gateway_cache_write_failures_total", "Cache entries that could not be persisted").unwrap();
    pub static ref RETRIES: Counter =
        register_counter!("gateway_retries_total", "Retried generation attempts").unwrap();
    pub static ref UPSTREAM_FAILURES: Counter =
        register_counter!("gateway_upstream_failures_total", "Failed calls to the chat upstream").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "gateway_request_latency_seconds",
        "Generation request latency in seconds"
    )
    .unwrap();
}
