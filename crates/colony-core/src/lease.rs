//! Short-lived target leases on depleting buffers.
//!
//! A lease pins a transport agent to one buffer for a fixed window so that
//! two agents do not flicker between the same pair of "closest" buffers.
//! Leases are never extended: once one lapses or its predicate fails it is
//! dropped and the agent re-selects.

use colony_types::{AgentRecord, AgentView, Lease, LeaseKind, ObjectId, WorldSnapshot};

use crate::config::EngineConfig;

/// Grants and validates leases.
#[derive(Debug, Clone, Copy)]
pub struct LeaseManager {
    window: u64,
    min_extractable: u32,
}

impl LeaseManager {
    /// Create a lease manager from the engine settings.
    pub const fn new(config: &EngineConfig) -> Self {
        Self {
            window: config.lease_window,
            min_extractable: config.min_extractable,
        }
    }

    /// Grant a lease on `target` into `record`, replacing any previous one.
    ///
    /// The engine only asks after it has selected the target on its own, so
    /// the request always succeeds.
    pub const fn try_acquire(
        &self,
        record: &mut AgentRecord,
        target: ObjectId,
        kind: LeaseKind,
        now: u64,
    ) -> bool {
        record.lease = Some(Lease {
            target,
            kind,
            expires_at: now.saturating_add(self.window),
        });
        true
    }

    /// Whether `lease` is still honored for `agent` in this snapshot.
    pub fn is_valid(&self, agent: &AgentView, lease: &Lease, snapshot: &WorldSnapshot) -> bool {
        if lease.is_expired(snapshot.cycle) {
            return false;
        }
        let Some(target) = snapshot.structure(lease.target) else {
            return false;
        };
        match lease.kind {
            LeaseKind::Acquire => target.stored > self.min_extractable && agent.store.free() > 0,
            LeaseKind::Deposit => target.free() > 0 && agent.store.used > 0,
        }
    }
}
