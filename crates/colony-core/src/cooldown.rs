//! Stability cooldown and commitment revalidation.
//!
//! A commitment is held until one of three things happens, checked in this
//! order: its target leaves the candidate set, its capacity-driven phase is
//! finished, or its cooldown passes. Invalidation is checked first so a
//! destroyed target never waits out the cooldown.

use colony_types::{AgentRecord, AgentView, Phase, WorldSnapshot};

use crate::config::ColonyConfig;
use crate::targets;

/// Outcome of revalidating one agent's commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep the commitment.
    Valid,
    /// The target is gone or no longer qualifies.
    TargetInvalidated,
    /// The store is full while acquiring, or empty while delivering.
    TaskFinished,
    /// The cooldown has passed.
    CooldownExpired,
}

/// Decides whether an agent's commitment may be revisited this cycle.
#[derive(Debug, Clone, Copy)]
pub struct CooldownGuard<'a> {
    config: &'a ColonyConfig,
}

impl<'a> CooldownGuard<'a> {
    /// Create a guard over the given configuration.
    pub const fn new(config: &'a ColonyConfig) -> Self {
        Self { config }
    }

    /// Revalidate `record` for `agent` against the snapshot.
    ///
    /// An uncommitted record is reported as [`Verdict::TargetInvalidated`]:
    /// there is nothing to keep.
    pub fn check(
        &self,
        agent: &AgentView,
        record: &AgentRecord,
        snapshot: &WorldSnapshot,
    ) -> Verdict {
        let (Some(task), Some(target)) = (record.task, record.target) else {
            return Verdict::TargetInvalidated;
        };
        if !record.is_committed() {
            return Verdict::TargetInvalidated;
        }
        let phase = record.phase.unwrap_or(Phase::Engage);

        if !targets::target_is_valid(task, phase, target, snapshot, self.config) {
            return Verdict::TargetInvalidated;
        }

        let finished = match phase {
            Phase::Acquire => agent.store.is_full(),
            Phase::Deliver => agent.store.is_empty(),
            Phase::Engage => false,
        };
        if finished {
            return Verdict::TaskFinished;
        }

        if snapshot.cycle > record.cooldown_expiry {
            return Verdict::CooldownExpired;
        }

        Verdict::Valid
    }

    /// Convenience form of [`Self::check`] over the agent's own record.
    pub fn is_commitment_still_valid(&self, agent: &AgentView, snapshot: &WorldSnapshot) -> bool {
        self.check(agent, &agent.record, snapshot) == Verdict::Valid
    }

    /// Cooldown expiry for a commitment made at `now`.
    ///
    /// Never earlier than `previous`, so the expiry only moves forward.
    pub const fn next_expiry(&self, previous: u64, now: u64) -> u64 {
        let candidate = now.saturating_add(self.config.engine.cooldown_window);
        if candidate > previous { candidate } else { previous }
    }
}
