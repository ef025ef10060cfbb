//! Named reconciliation scenarios.
//!
//! Each vector describes the state of both sides relative to an agreed base
//! and the decision a plain or forced sync must take from there.

use taskflow_remote_core::{ForceMode, ModeError, SyncOptions};
use taskflow_remote_sync::{Decision, SyncError};

use crate::fixtures::SyncFixture;

const BASE: &[u8] = b"tasks:\n- id: 1\n  title: base\n";
const LOCAL: &[u8] = b"tasks:\n- id: 1\n  title: local edit\n";
const REMOTE: &[u8] = b"tasks:\n- id: 1\n  title: remote edit\n";

/// A reconciliation scenario.
#[derive(Debug, Clone)]
pub struct ScenarioVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Whether local and remote agreed on `BASE` at `v1` before the run.
    pub synced: bool,
    /// Local main document at the time of the run.
    pub local: &'static [u8],
    /// Remote main document, if another client pushed after `v1`.
    pub remote_edit: Option<&'static [u8]>,
    pub options: SyncOptions,
    /// Expected decision, or `None` when the run must fail with a mode error.
    pub expected: Option<Decision>,
}

/// Get all scenario vectors.
pub fn all_vectors() -> Vec<ScenarioVector> {
    vec![
        ScenarioVector {
            name: "first sync adopts remote",
            synced: false,
            local: LOCAL,
            remote_edit: None,
            options: SyncOptions::new(),
            expected: Some(Decision::FirstSync),
        },
        ScenarioVector {
            name: "first sync ignores force",
            synced: false,
            local: LOCAL,
            remote_edit: Some(REMOTE),
            options: SyncOptions::forced(ForceMode::Push),
            expected: Some(Decision::FirstSync),
        },
        ScenarioVector {
            name: "nothing changed",
            synced: true,
            local: BASE,
            remote_edit: None,
            options: SyncOptions::new(),
            expected: Some(Decision::UpToDate),
        },
        ScenarioVector {
            name: "local edit pushes",
            synced: true,
            local: LOCAL,
            remote_edit: None,
            options: SyncOptions::new(),
            expected: Some(Decision::Push),
        },
        ScenarioVector {
            name: "remote edit fast-forwards",
            synced: true,
            local: BASE,
            remote_edit: Some(REMOTE),
            options: SyncOptions::new(),
            expected: Some(Decision::FastForward),
        },
        ScenarioVector {
            name: "both edited diverges",
            synced: true,
            local: LOCAL,
            remote_edit: Some(REMOTE),
            options: SyncOptions::new(),
            expected: Some(Decision::Diverged),
        },
        ScenarioVector {
            name: "both edited, forced push",
            synced: true,
            local: LOCAL,
            remote_edit: Some(REMOTE),
            options: SyncOptions::forced(ForceMode::Push),
            expected: Some(Decision::ForcedPush),
        },
        ScenarioVector {
            name: "both edited, forced pull",
            synced: true,
            local: LOCAL,
            remote_edit: Some(REMOTE),
            options: SyncOptions::forced(ForceMode::Pull),
            expected: Some(Decision::ForcedPull),
        },
        ScenarioVector {
            name: "both edited, force without mode",
            synced: true,
            local: LOCAL,
            remote_edit: Some(REMOTE),
            options: SyncOptions {
                force: true,
                mode: None,
            },
            expected: None,
        },
        ScenarioVector {
            name: "remote rewritten with identical content",
            synced: true,
            local: BASE,
            remote_edit: Some(BASE),
            options: SyncOptions::new(),
            expected: Some(Decision::FastForward),
        },
    ]
}

/// Build the fixture a vector describes.
pub fn fixture_for(vector: &ScenarioVector) -> SyncFixture {
    let fixture = if vector.synced {
        SyncFixture::synced(BASE)
    } else {
        SyncFixture::unsynced(BASE, BASE)
    };
    fixture.edit_local(vector.local);
    if let Some(remote) = vector.remote_edit {
        fixture.edit_remote(remote);
    }
    fixture
}

/// Run one vector, returning whether the outcome matched and what it was.
pub async fn run_vector(vector: &ScenarioVector) -> (bool, String) {
    let fixture = fixture_for(vector);
    match (fixture.sync_with(vector.options).await, vector.expected) {
        (Ok(outcome), Some(expected)) => {
            let decision = outcome.decision();
            let consistent = outcome.is_diverged() || fixture.converged();
            (decision == expected && consistent, format!("{decision:?}"))
        }
        (Err(SyncError::Mode(ModeError::Missing)), None) => (true, "mode required".to_string()),
        (Ok(outcome), None) => (false, format!("{:?}", outcome.decision())),
        (Err(e), _) => (false, e.to_string()),
    }
}

/// Run all vectors.
///
/// Returns `(name, matched, observed)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => {
            return all_vectors()
                .iter()
                .map(|v| (v.name.to_string(), false, e.to_string()))
                .collect()
        }
    };
    all_vectors()
        .iter()
        .map(|v| {
            let (matched, observed) = runtime.block_on(run_vector(v));
            (v.name.to_string(), matched, observed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_pass() {
        for (name, matched, observed) in verify_all_vectors() {
            assert!(matched, "vector '{name}' observed {observed}");
        }
    }

    #[test]
    fn test_vectors_cover_every_decision() {
        let covered: Vec<Decision> = all_vectors().iter().filter_map(|v| v.expected).collect();
        for decision in [
            Decision::FirstSync,
            Decision::UpToDate,
            Decision::Push,
            Decision::FastForward,
            Decision::Diverged,
            Decision::ForcedPush,
            Decision::ForcedPull,
        ] {
            assert!(covered.contains(&decision), "no vector for {decision:?}");
        }
    }

    #[tokio::test]
    async fn test_diverged_vector_leaves_both_sides() {
        let vector = all_vectors()
            .into_iter()
            .find(|v| v.expected == Some(Decision::Diverged))
            .unwrap();
        let fixture = fixture_for(&vector);
        fixture.sync_with(vector.options).await.unwrap();

        assert_eq!(&fixture.local_main()[..], LOCAL);
        assert_eq!(&fixture.remote.main()[..], REMOTE);
    }
}
