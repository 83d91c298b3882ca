//! Request and response envelope types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphqlClientError, GraphqlError};

/// Variable set sent alongside a query document.
///
/// The pagination driver seeds this with a page-size and a page-cursor
/// entry before the first round trip.
pub type Variables = serde_json::Map<String, Value>;

/// GraphQL query wrapper.
///
/// The query document is opaque text; it is never parsed or validated
/// client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlQuery {
    query: String,
}

impl GraphqlQuery {
    /// Create a new query from a string.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    /// Create a new query from a static string.
    #[must_use]
    pub fn from_static(query: &'static str) -> Self {
        Self::new(query)
    }

    /// Return the query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.query
    }
}

/// GraphQL request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlRequest<V> {
    /// Query text.
    pub query: GraphqlQuery,
    /// Variables.
    pub variables: V,
    /// Optional operation name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl<V: Serialize> GraphqlRequest<V> {
    /// Create a new request.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(query: GraphqlQuery, variables: V) -> Self {
        Self {
            query,
            variables,
            operation_name: None,
        }
    }

    /// Attach an operation name.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Serialize the `{query, variables[, operationName]}` POST body.
    pub fn to_body(&self) -> Result<Vec<u8>, GraphqlClientError> {
        let mut body = serde_json::Map::new();
        body.insert(
            "query".to_string(),
            Value::String(self.query.as_str().to_string()),
        );
        body.insert(
            "variables".to_string(),
            serde_json::to_value(&self.variables)?,
        );
        if let Some(ref operation_name) = self.operation_name {
            body.insert(
                "operationName".to_string(),
                Value::String(operation_name.clone()),
            );
        }
        Ok(serde_json::to_vec(&Value::Object(body))?)
    }
}

/// GraphQL response container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphqlResponse<T> {
    /// Response data.
    #[serde(default)]
    pub data: Option<T>,
    /// GraphQL errors.
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
    /// Extensions payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl<T> GraphqlResponse<T> {
    /// Returns `true` if no GraphQL errors were returned.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Classify the response: a non-empty `errors` array is a permanent
    /// failure carrying the full error list, otherwise the data tree is
    /// returned unchanged.
    pub fn into_data(self) -> Result<T, GraphqlClientError> {
        if !self.errors.is_empty() {
            return Err(GraphqlClientError::GraphqlErrors {
                errors: self.errors,
            });
        }
        self.data.ok_or_else(|| GraphqlClientError::Protocol {
            message: "response carried neither data nor errors".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_omits_operation_name_when_unset() {
        let request = GraphqlRequest::new(
            GraphqlQuery::from_static("query Viewer { viewer { id } }"),
            Variables::new(),
        );
        let body: Value =
            serde_json::from_slice(&request.to_body().expect("body")).expect("json");
        assert_eq!(
            body.get("query").and_then(Value::as_str),
            Some("query Viewer { viewer { id } }")
        );
        assert!(body.get("operationName").is_none());
    }

    #[test]
    fn test_body_includes_operation_name_when_set() {
        let request = GraphqlRequest::new(
            GraphqlQuery::from_static("query Viewer { viewer { id } }"),
            Variables::new(),
        )
        .with_operation_name("Viewer");
        let body: Value =
            serde_json::from_slice(&request.to_body().expect("body")).expect("json");
        assert_eq!(
            body.get("operationName").and_then(Value::as_str),
            Some("Viewer")
        );
    }

    #[test]
    fn test_into_data_passes_clean_responses_through() {
        let response: GraphqlResponse<Value> = serde_json::from_value(serde_json::json!({
            "data": {"viewer": {"id": "user-1"}}
        }))
        .expect("response");
        assert!(response.is_ok());
        let data = response.into_data().expect("data");
        assert_eq!(
            data.pointer("/viewer/id").and_then(Value::as_str),
            Some("user-1")
        );
    }

    #[test]
    fn test_into_data_raises_on_errors() {
        let response: GraphqlResponse<Value> = serde_json::from_value(serde_json::json!({
            "errors": [{"message": "boom"}]
        }))
        .expect("response");
        let err = response.into_data().expect_err("should fail");
        match err {
            GraphqlClientError::GraphqlErrors { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_data_raises_on_missing_data() {
        let response: GraphqlResponse<Value> =
            serde_json::from_value(serde_json::json!({})).expect("response");
        let err = response.into_data().expect_err("should fail");
        assert!(matches!(err, GraphqlClientError::Protocol { .. }));
    }
}
