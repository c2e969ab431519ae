//! Ranking oracle test doubles

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dispatch_core::{DispatchError, DispatchResult};
use dispatch_domain::entities::{CandidateRecord, RankedCandidate};
use dispatch_domain::ports::RankingOracle;

/// Deterministic oracle: returns the candidate pool in insertion order,
/// with descending scores. Records every call for assertions.
#[derive(Clone, Default)]
pub struct ScriptedRankingOracle {
    calls: Arc<Mutex<usize>>,
}

impl ScriptedRankingOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RankingOracle for ScriptedRankingOracle {
    async fn rank(
        &self,
        _context: &serde_json::Value,
        pool: &[CandidateRecord],
    ) -> DispatchResult<Vec<RankedCandidate>> {
        *self.calls.lock().unwrap() += 1;
        Ok(pool
            .iter()
            .enumerate()
            .map(|(index, candidate)| RankedCandidate {
                volunteer_id: candidate.volunteer_id.clone(),
                score: 1.0 - index as f64 * 0.1,
                distance_km: candidate.distance_km,
                reason: format!("scripted rank {index}"),
            })
            .collect())
    }
}

/// Oracle that always fails with the configured error kind.
pub struct FailingRankingOracle {
    format_error: bool,
}

impl FailingRankingOracle {
    /// Fails with `RankingFormat`.
    pub fn malformed() -> Self {
        Self { format_error: true }
    }

    /// Fails with `OracleUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            format_error: false,
        }
    }
}

#[async_trait]
impl RankingOracle for FailingRankingOracle {
    async fn rank(
        &self,
        _context: &serde_json::Value,
        _pool: &[CandidateRecord],
    ) -> DispatchResult<Vec<RankedCandidate>> {
        if self.format_error {
            Err(DispatchError::RankingFormat(
                "scripted malformed output".to_string(),
            ))
        } else {
            Err(DispatchError::OracleUnavailable(
                "scripted outage".to_string(),
            ))
        }
    }
}
