//! Tracks liveness per backend so the router can demote a struggling
//! adapter without removing it outright — a backend that recovers should
//! rejoin the candidate pool on its own, not require an operator restart.

use dashmap::DashMap;
use tts_gateway_core::voice::BackendKind;

const FAILURES_BEFORE_DOWN: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
pub struct HealthRecord {
    pub state: HealthState,
    pub consecutive_failures: u32,
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self {
            state: HealthState::Unknown,
            consecutive_failures: 0,
        }
    }
}

pub struct BackendHealth {
    records: DashMap<BackendKind, HealthRecord>,
}

impl BackendHealth {
    pub fn new() -> Self {
        let records = DashMap::new();
        for kind in BackendKind::all() {
            records.insert(kind, HealthRecord::default());
        }
        Self { records }
    }

    pub fn record_success(&self, kind: BackendKind) {
        let mut entry = self.records.entry(kind).or_default();
        entry.state = HealthState::Up;
        entry.consecutive_failures = 0;
    }

    /// Returns the backend's state after applying this failure, so the
    /// caller can log a demotion exactly when it happens.
    pub fn record_failure(&self, kind: BackendKind) -> HealthState {
        let mut entry = self.records.entry(kind).or_default();
        entry.consecutive_failures += 1;
        if entry.consecutive_failures >= FAILURES_BEFORE_DOWN {
            entry.state = HealthState::Down;
        }
        entry.state
    }

    pub fn state(&self, kind: BackendKind) -> HealthState {
        self.records.get(&kind).map(|r| r.state).unwrap_or(HealthState::Unknown)
    }

    pub fn snapshot(&self) -> Vec<(BackendKind, HealthRecord)> {
        self.records.iter().map(|r| (*r.key(), *r.value())).collect()
    }
}

impl Default for BackendHealth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown_for_every_backend() {
        let health = BackendHealth::new();
        for kind in BackendKind::all() {
            assert_eq!(health.state(kind), HealthState::Unknown);
        }
    }

    #[test]
    fn three_consecutive_failures_demote_to_down() {
        let health = BackendHealth::new();
        health.record_failure(BackendKind::NeuralRest);
        health.record_failure(BackendKind::NeuralRest);
        assert_eq!(health.state(BackendKind::NeuralRest), HealthState::Unknown);
        health.record_failure(BackendKind::NeuralRest);
        assert_eq!(health.state(BackendKind::NeuralRest), HealthState::Down);
    }

    #[test]
    fn success_resets_failure_count_and_marks_up() {
        let health = BackendHealth::new();
        health.record_failure(BackendKind::NeuralRest);
        health.record_failure(BackendKind::NeuralRest);
        health.record_success(BackendKind::NeuralRest);
        assert_eq!(health.state(BackendKind::NeuralRest), HealthState::Up);
        health.record_failure(BackendKind::NeuralRest);
        health.record_failure(BackendKind::NeuralRest);
        assert_eq!(health.state(BackendKind::NeuralRest), HealthState::Up);
    }
}
