//! Operation Context
//!
//! Contains metadata about the current operation for tracing.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the per-request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Context for an operation, used for log correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self {
            correlation_id: None,
        }
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the context from the `x-request-id` header set by the request-id
/// layer, falling back to a fresh UUID when the header is absent or not a UUID.
#[axum::async_trait]
impl<S> FromRequestParts<S> for OperationContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(OperationContext::new().with_correlation_id(correlation_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_context_builder() {
        let correlation_id = Uuid::new_v4();

        assert!(OperationContext::default().correlation_id.is_none());

        let context = OperationContext::new().with_correlation_id(correlation_id);
        assert_eq!(context.correlation_id, Some(correlation_id));
    }

    #[tokio::test]
    async fn test_extract_from_request_id_header() {
        let request_id = Uuid::new_v4();
        let request = Request::builder()
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let context = OperationContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(context.correlation_id, Some(request_id));
    }

    #[tokio::test]
    async fn test_extract_generates_id_for_garbage_header() {
        let request = Request::builder()
            .header(REQUEST_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let context = OperationContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(context.correlation_id.is_some());
    }
}
