//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use tallybar_core::UsageSnapshot;
use tallybar_store::{RefreshState, RefreshStatus};

// ============================================================================
// Output Types
// ============================================================================

/// JSON form of a refresh outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput<'a> {
    /// `idle`, `fetching`, `succeeded`, `failed`, or `cached`.
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<&'a UsageSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOutput<'a>>,
}

/// Failure details.
#[derive(Debug, Serialize)]
pub struct ErrorOutput<'a> {
    pub kind: String,
    pub message: &'a str,
}

impl<'a> StatusOutput<'a> {
    /// Describes the controller status.
    pub fn from_status(status: &'a RefreshStatus) -> Self {
        let (state, error) = match &status.state {
            RefreshState::Idle => ("idle", None),
            RefreshState::Fetching => ("fetching", None),
            RefreshState::Succeeded => ("succeeded", None),
            RefreshState::Failed { kind, message } => (
                "failed",
                Some(ErrorOutput {
                    kind: kind.to_string(),
                    message,
                }),
            ),
        };
        Self {
            state,
            snapshot: status.snapshot.as_ref(),
            error,
        }
    }

    /// Describes a snapshot read straight from the cache.
    pub fn cached(snapshot: Option<&'a UsageSnapshot>) -> Self {
        Self {
            state: "cached",
            snapshot,
            error: None,
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}
