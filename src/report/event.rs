//! Test outcome events
//!
//! One [`OutcomeEvent`] is produced by the host per observed test result.
//! Events serialize as JSON objects such as
//! `{"test_name": "a::b", "outcome": "fail", "duration_ms": 12, "error_message": "boom"}`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a test ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Test passed
    #[serde(alias = "passed")]
    Pass,
    /// Test failed
    #[serde(alias = "failed")]
    Fail,
    /// Test was skipped
    #[serde(alias = "skipped", alias = "ignored")]
    Skip,
    /// Test has no outcome (explicit or not run)
    None,
    /// Test could not be found
    #[serde(alias = "notfound")]
    NotFound,
}

/// One observed test result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    /// Fully-qualified test name
    pub test_name: String,
    /// How the test ended
    #[serde(rename = "outcome")]
    pub kind: OutcomeKind,
    /// How long the test ran
    #[serde(rename = "duration_ms", with = "duration_ms", default)]
    pub duration: Duration,
    /// Failure message, or skip reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Failure stack trace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl OutcomeEvent {
    /// An event with no message or stack trace
    pub fn new(test_name: impl Into<String>, kind: OutcomeKind, duration: Duration) -> Self {
        Self {
            test_name: test_name.into(),
            kind,
            duration,
            error_message: None,
            stack_trace: None,
        }
    }

    /// Passed test taking `ms` milliseconds
    pub fn pass(test_name: impl Into<String>, ms: u64) -> Self {
        Self::new(test_name, OutcomeKind::Pass, Duration::from_millis(ms))
    }

    /// Failed test taking `ms` milliseconds
    pub fn fail(test_name: impl Into<String>, ms: u64) -> Self {
        Self::new(test_name, OutcomeKind::Fail, Duration::from_millis(ms))
    }

    /// Skipped test
    pub fn skip(test_name: impl Into<String>) -> Self {
        Self::new(test_name, OutcomeKind::Skip, Duration::ZERO)
    }

    /// Attach a failure message or skip reason
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Attach a stack trace
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Message text, empty when absent
    #[must_use]
    pub fn message(&self) -> &str {
        self.error_message.as_deref().unwrap_or_default()
    }

    /// Stack trace text, empty when absent
    #[must_use]
    pub fn trace(&self) -> &str {
        self.stack_trace.as_deref().unwrap_or_default()
    }
}

/// (De)serialize a [`Duration`] as a number of milliseconds
mod duration_ms {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(D::Error::custom(format!(
                "duration_ms must be a non-negative number, got {ms}"
            )));
        }
        Duration::try_from_secs_f64(ms / 1000.0).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_event() {
        let event: OutcomeEvent = serde_json::from_str(
            r#"{"test_name":"suite::b","outcome":"failed","duration_ms":10,"error_message":"x","stack_trace":"at b()"}"#,
        )
        .unwrap();
        assert_eq!(event.test_name, "suite::b");
        assert_eq!(event.kind, OutcomeKind::Fail);
        assert_eq!(event.duration, Duration::from_millis(10));
        assert_eq!(event.message(), "x");
        assert_eq!(event.trace(), "at b()");
    }

    #[test]
    fn test_optional_fields_default() {
        let event: OutcomeEvent =
            serde_json::from_str(r#"{"test_name":"c","outcome":"skip"}"#).unwrap();
        assert_eq!(event.kind, OutcomeKind::Skip);
        assert_eq!(event.duration, Duration::ZERO);
        assert_eq!(event.message(), "");
        assert_eq!(event.trace(), "");
    }

    #[test]
    fn test_outcome_aliases() {
        for (text, kind) in [
            ("\"pass\"", OutcomeKind::Pass),
            ("\"passed\"", OutcomeKind::Pass),
            ("\"fail\"", OutcomeKind::Fail),
            ("\"skipped\"", OutcomeKind::Skip),
            ("\"ignored\"", OutcomeKind::Skip),
            ("\"none\"", OutcomeKind::None),
            ("\"not_found\"", OutcomeKind::NotFound),
            ("\"notfound\"", OutcomeKind::NotFound),
        ] {
            assert_eq!(serde_json::from_str::<OutcomeKind>(text).unwrap(), kind, "{text}");
        }
    }

    #[test]
    fn test_fractional_duration() {
        let event: OutcomeEvent =
            serde_json::from_str(r#"{"test_name":"a","outcome":"pass","duration_ms":0.5}"#)
                .unwrap();
        assert_eq!(event.duration, Duration::from_micros(500));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let err = serde_json::from_str::<OutcomeEvent>(
            r#"{"test_name":"a","outcome":"pass","duration_ms":-1}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_out_of_range_duration_rejected() {
        assert!(serde_json::from_str::<OutcomeEvent>(
            r#"{"test_name":"a","outcome":"pass","duration_ms":1e30}"#,
        )
        .is_err());
    }

    #[test]
    fn test_unknown_outcome_rejected() {
        assert!(serde_json::from_str::<OutcomeEvent>(
            r#"{"test_name":"a","outcome":"exploded"}"#
        )
        .is_err());
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let json = serde_json::to_string(&OutcomeEvent::pass("a", 50)).unwrap();
        assert_eq!(
            json,
            r#"{"test_name":"a","outcome":"pass","duration_ms":50}"#
        );
    }

    #[test]
    fn test_builders() {
        let event = OutcomeEvent::fail("b", 10)
            .with_message("x")
            .with_stack_trace("trace");
        assert_eq!(event.kind, OutcomeKind::Fail);
        assert_eq!(event.error_message.as_deref(), Some("x"));
        assert_eq!(event.stack_trace.as_deref(), Some("trace"));
        assert_eq!(OutcomeEvent::skip("c").kind, OutcomeKind::Skip);
    }
}
