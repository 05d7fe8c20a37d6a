//! Utility modules supporting the aggregation pipeline.
//!
//! - [`HttpClient`]: shared, pooled HTTP client used by every source adapter
//! - [`json`]: lenient decoding helpers for loosely typed provider payloads

mod http;
pub mod json;

pub use http::{HttpClient, DEFAULT_TIMEOUT};

/// Shorten a response body for log output
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("0123456789abc", 10), "0123456789...");
        assert_eq!(truncate_for_log("ääää", 2), "ää...");
    }
}
