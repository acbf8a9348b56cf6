//! Cross-cutting result and record types
//!
//! Every optimization operation produces an [`OptimizationResult`] and
//! appends exactly one [`OptimizationRecord`] to the history store under a
//! freshly minted [`ProcessId`].

use crate::error::OptimizeError;
use crate::placer::PlacementOutcome;
use crate::power::PowerOutcome;
use crate::router::RoutingOutcome;
use crate::synth::SynthOutcome;
use crate::timing::TimingOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Optimization type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationKind {
    Placement,
    Routing,
    LogicSynthesis,
    Power,
    Timing,
}

impl OptimizationKind {
    /// All known optimization types
    pub const ALL: [OptimizationKind; 5] = [
        OptimizationKind::Placement,
        OptimizationKind::Routing,
        OptimizationKind::LogicSynthesis,
        OptimizationKind::Power,
        OptimizationKind::Timing,
    ];

    /// Canonical tag string
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationKind::Placement => "placement",
            OptimizationKind::Routing => "routing",
            OptimizationKind::LogicSynthesis => "logic_synthesis",
            OptimizationKind::Power => "power",
            OptimizationKind::Timing => "timing",
        }
    }
}

impl fmt::Display for OptimizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationKind {
    type Err = OptimizeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "placement" => Ok(OptimizationKind::Placement),
            "routing" => Ok(OptimizationKind::Routing),
            "logic_synthesis" => Ok(OptimizationKind::LogicSynthesis),
            "power" => Ok(OptimizationKind::Power),
            "timing" => Ok(OptimizationKind::Timing),
            other => Err(OptimizeError::UnsupportedOptimizationType(
                other.to_string(),
            )),
        }
    }
}

/// Outcome status of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStatus {
    Success,
    Error,
}

/// Type-specific payload of a successful operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizationPayload {
    Placement(PlacementOutcome),
    Routing(RoutingOutcome),
    LogicSynthesis(SynthOutcome),
    Power(PowerOutcome),
    Timing(TimingOutcome),
}

/// Result returned by every optimization operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Success or error
    pub status: OptimizationStatus,
    /// Optimization type that ran
    pub kind: OptimizationKind,
    /// Algorithm that actually executed (after default fallback)
    pub algorithm: String,
    /// Type-specific payload, present on success
    pub payload: Option<OptimizationPayload>,
    /// Human-readable message, present on error
    pub message: Option<String>,
}

impl OptimizationResult {
    /// Build a success result
    pub fn success(
        kind: OptimizationKind,
        algorithm: impl Into<String>,
        payload: OptimizationPayload,
    ) -> Self {
        Self {
            status: OptimizationStatus::Success,
            kind,
            algorithm: algorithm.into(),
            payload: Some(payload),
            message: None,
        }
    }

    /// Build an error result from a captured fault
    pub fn failure(
        kind: OptimizationKind,
        algorithm: impl Into<String>,
        error: &OptimizeError,
    ) -> Self {
        Self {
            status: OptimizationStatus::Error,
            kind,
            algorithm: algorithm.into(),
            payload: None,
            message: Some(error.to_string()),
        }
    }

    /// Whether the operation succeeded
    pub fn is_success(&self) -> bool {
        self.status == OptimizationStatus::Success
    }
}

/// Identifier minted per top-level operation, keying its history entries
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessId(String);

impl ProcessId {
    /// Mint a process id from an engine-local sequence number
    pub(crate) fn mint(seq: u64) -> Self {
        Self(format!("opt-{seq:06}"))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcessId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Immutable record of one optimization invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRecord {
    /// Process identifier the record is keyed by
    pub process_id: ProcessId,
    /// Optimization type
    pub kind: OptimizationKind,
    /// Algorithm that ran
    pub algorithm: String,
    /// When the operation finished
    pub timestamp: DateTime<Utc>,
    /// The full result, success or error
    pub result: OptimizationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_tags() {
        for kind in OptimizationKind::ALL {
            assert_eq!(kind.as_str().parse::<OptimizationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = "blockchain".parse::<OptimizationKind>().unwrap_err();
        assert_eq!(err.kind(), "unsupported_optimization_type");
    }

    #[test]
    fn process_ids_are_distinct() {
        assert_ne!(ProcessId::mint(1), ProcessId::mint(2));
        assert_eq!(ProcessId::mint(7).as_str(), "opt-000007");
    }
}
