//! Tower middleware layers.
//!
//! - [`correlation`] -- the inbound [`CorrelationIdLayer`](correlation::CorrelationIdLayer):
//!   reads, validates, generates, and binds the correlation id of every request.
//! - [`outbound`] -- the [`ForwardCorrelationIdLayer`](outbound::ForwardCorrelationIdLayer)
//!   for HTTP clients: attaches the ambient id to outgoing requests.

pub mod correlation;
pub mod outbound;

use http::{HeaderMap, HeaderName, HeaderValue};

/// Convert a correlation id into a header value.
///
/// Ids are written byte-for-byte; ids that can't be carried in a header
/// (control characters) are skipped with a warning.
pub(crate) fn header_value(correlation_id: &str) -> Option<HeaderValue> {
    match HeaderValue::from_bytes(correlation_id.as_bytes()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id.escape_debug(),
                error = %e,
                "correlation id is not a valid header value, not writing it"
            );
            None
        }
    }
}

/// Insert `name: value` unless `name` is already present. Returns whether
/// the header was written.
pub(crate) fn insert_if_absent(headers: &mut HeaderMap, name: &HeaderName, value: HeaderValue) -> bool {
    if headers.contains_key(name) {
        return false;
    }
    headers.insert(name.clone(), value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_header_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert("x-correlation-id", HeaderValue::from_static("first"));
        let name = HeaderName::from_static("x-correlation-id");

        assert!(!insert_if_absent(&mut headers, &name, HeaderValue::from_static("second")));
        assert_eq!(headers.get_all(&name).iter().count(), 1);
        assert_eq!(headers.get(&name).unwrap(), "first");
    }

    #[test]
    fn control_characters_are_rejected() {
        assert!(header_value("abc\ndef").is_none());
        assert!(header_value("abc-def").is_some());
    }
}
