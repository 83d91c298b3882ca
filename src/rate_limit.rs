//! Per-request rate limit telemetry.

use std::fmt;

use serde_json::Value;

/// Rate limit record for one round trip.
///
/// Purely advisory: the pagination driver reports it to the caller and
/// never uses it to throttle or pace requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    /// Maximum credits in the current window, `-1` when unknown.
    pub limit: i64,
    /// Credits spent by this request.
    pub cost: i64,
    /// Credits remaining in the current window.
    pub remaining: i64,
    /// Timestamp at which the window resets, as reported by the server.
    pub reset_at: String,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            limit: -1,
            cost: 0,
            remaining: 0,
            reset_at: String::new(),
        }
    }
}

impl RateLimit {
    /// Remove the `rateLimit` entry from the top level of a data tree and
    /// parse it.
    ///
    /// The entry is popped out so downstream page accumulation never sees
    /// rate limit noise mixed into data. An absent entry yields the
    /// default record; fields missing from a present entry default to `-1`.
    #[must_use]
    pub fn take(data: &mut Value) -> Self {
        let Some(entry) = data.as_object_mut().and_then(|map| map.remove("rateLimit")) else {
            return Self::default();
        };
        Self::from_value(&entry)
    }

    /// Parse a rate limit object, defaulting missing fields.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_i64).unwrap_or(-1);
        Self {
            limit: field("limit"),
            cost: field("cost"),
            remaining: field("remaining"),
            reset_at: value
                .get("resetAt")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cost {}, remaining {}, reset at {}",
            self.cost, self.remaining, self.reset_at
        )
    }
}
