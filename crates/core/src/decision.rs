use serde::{Deserialize, Serialize};

/// The verdict of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Allow,
    Deny,
}

/// An authorization decision, produced once per request and immutable.
///
/// Serializes to the wire/cache shape `{"decision": "...", "reasons": [...]}`.
/// `reasons` is ordered and only ever populated for DENY (policy ids from the
/// engine, or the failure class for fail-closed synthetics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "decision")]
    pub outcome: Outcome,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            outcome: Outcome::Allow,
            reasons: Vec::new(),
        }
    }

    pub fn deny(reasons: Vec<String>) -> Self {
        Self {
            outcome: Outcome::Deny,
            reasons,
        }
    }

    pub fn is_allow(&self) -> bool {
        self.outcome == Outcome::Allow
    }
}

/// One slot of a batch evaluation result.
///
/// Positional: slot `i` always answers input item `i`, whether the item
/// produced a decision or failed on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Decision(Decision),
    Failed { error: BatchItemError },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemError {
    pub code: String,
    pub message: String,
}

impl BatchOutcome {
    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            error: BatchItemError {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
