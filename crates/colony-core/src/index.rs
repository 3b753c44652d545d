//! Cycle-scoped occupancy index.
//!
//! Built fresh from the snapshot at the start of every cycle and never
//! persisted. It answers three questions for the scheduler, balancer, and
//! lease manager: how many agents execute each task, how many node-drawing
//! agents sit on each node, and which agents hold a live lease on each
//! buffer.
//!
//! While the engine walks the population it releases an agent's previous
//! contribution before re-planning that agent and reserves the new one after
//! committing, so task maxima hold within a single cycle.

use std::collections::{BTreeMap, BTreeSet};

use colony_types::{AgentId, AgentRecord, ObjectId, TaskKind, WorldSnapshot};

/// Occupancy counts for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleIndex {
    /// Cycle the index was built for.
    now: u64,
    /// Ids of every resource node in the snapshot.
    nodes: BTreeSet<ObjectId>,
    /// Executing agents per task.
    task_counts: BTreeMap<TaskKind, u32>,
    /// Node-drawing agents per node.
    node_load: BTreeMap<ObjectId, u32>,
    /// Holders of an unexpired lease per target.
    leases: BTreeMap<ObjectId, BTreeSet<AgentId>>,
}

impl CycleIndex {
    /// Build the index from every agent's pre-cycle record.
    pub fn build(snapshot: &WorldSnapshot) -> Self {
        let mut index = Self {
            now: snapshot.cycle,
            nodes: snapshot.nodes.iter().map(|n| n.id).collect(),
            ..Self::default()
        };
        for agent in &snapshot.agents {
            index.reserve(agent.id, &agent.record);
        }
        index
    }

    /// Agents currently executing `task`.
    pub fn occupancy(&self, task: TaskKind) -> u32 {
        self.task_counts.get(&task).copied().unwrap_or(0)
    }

    /// Executing counts for every task with at least one agent.
    pub fn task_counts(&self) -> &BTreeMap<TaskKind, u32> {
        &self.task_counts
    }

    /// Node-drawing agents committed to `node`.
    pub fn node_load(&self, node: ObjectId) -> u32 {
        self.node_load.get(&node).copied().unwrap_or(0)
    }

    /// Agents other than `agent` holding an unexpired lease on `target`.
    pub fn leased_by_others(&self, target: ObjectId, agent: AgentId) -> u32 {
        self.leases.get(&target).map_or(0, |holders| {
            let others = holders.iter().filter(|holder| **holder != agent).count();
            u32::try_from(others).unwrap_or(u32::MAX)
        })
    }

    /// Count `record` toward the occupancy of its task, node, and lease.
    pub fn reserve(&mut self, agent: AgentId, record: &AgentRecord) {
        if record.is_committed() {
            if let Some(task) = record.task {
                let count = self.task_counts.entry(task).or_insert(0);
                *count = count.saturating_add(1);

                if let Some(target) = self.node_target(task, record) {
                    let load = self.node_load.entry(target).or_insert(0);
                    *load = load.saturating_add(1);
                }
            }
        }
        if let Some(lease) = record.lease.filter(|l| !l.is_expired(self.now)) {
            self.leases.entry(lease.target).or_default().insert(agent);
        }
    }

    /// Remove `record`'s contribution, the inverse of [`Self::reserve`].
    pub fn release(&mut self, agent: AgentId, record: &AgentRecord) {
        if record.is_committed() {
            if let Some(task) = record.task {
                if let Some(count) = self.task_counts.get_mut(&task) {
                    *count = count.saturating_sub(1);
                }
                if let Some(target) = self.node_target(task, record) {
                    if let Some(load) = self.node_load.get_mut(&target) {
                        *load = load.saturating_sub(1);
                    }
                }
            }
        }
        self.release_lease(agent, record);
    }

    /// Remove only `record`'s lease contribution.
    pub fn release_lease(&mut self, agent: AgentId, record: &AgentRecord) {
        if let Some(lease) = record.lease {
            if let Some(holders) = self.leases.get_mut(&lease.target) {
                holders.remove(&agent);
            }
        }
    }

    fn node_target(&self, task: TaskKind, record: &AgentRecord) -> Option<ObjectId> {
        record
            .target
            .filter(|target| task.draws_from_nodes() && self.nodes.contains(target))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use colony_types::{
        AgentView, CarryStore, Lease, LeaseKind, Phase, Position, ResourceNode, TaskStatus,
    };

    use super::*;

    fn node(id: u128) -> ResourceNode {
        ResourceNode {
            id: ObjectId::from_u128(id),
            position: Position::new(0, 0),
            remaining: 100,
            capacity: 100,
            regen_per_cycle: 0,
            valid: true,
        }
    }

    fn committed(task: TaskKind, target: u128) -> AgentRecord {
        AgentRecord {
            task: Some(task),
            target: Some(ObjectId::from_u128(target)),
            phase: Some(Phase::Acquire),
            status: TaskStatus::Executing,
            cooldown_expiry: 60,
            lease: None,
        }
    }

    fn agent(id: u128, record: AgentRecord) -> AgentView {
        AgentView {
            id: AgentId::from_u128(id),
            position: Position::new(1, 1),
            store: CarryStore::new(0, 50),
            capabilities: BTreeSet::new(),
            record,
        }
    }

    fn world() -> WorldSnapshot {
        WorldSnapshot {
            cycle: 10,
            nodes: vec![node(100)],
            agents: vec![
                agent(1, committed(TaskKind::Harvest, 100)),
                agent(2, committed(TaskKind::Harvest, 100)),
                agent(3, committed(TaskKind::Store, 200)),
                agent(4, AgentRecord::default()),
            ],
            ..WorldSnapshot::default()
        }
    }

    #[test]
    fn counts_executing_agents_only() {
        let index = CycleIndex::build(&world());
        assert_eq!(index.occupancy(TaskKind::Harvest), 2);
        assert_eq!(index.occupancy(TaskKind::Store), 1);
        assert_eq!(index.occupancy(TaskKind::Upgrade), 0);
        assert_eq!(index.node_load(ObjectId::from_u128(100)), 2);
        // Store targets a structure, not a node.
        assert_eq!(index.node_load(ObjectId::from_u128(200)), 0);
    }

    #[test]
    fn release_then_reserve_is_neutral() {
        let mut index = CycleIndex::build(&world());
        let record = committed(TaskKind::Harvest, 100);
        index.release(AgentId::from_u128(1), &record);
        assert_eq!(index.occupancy(TaskKind::Harvest), 1);
        assert_eq!(index.node_load(ObjectId::from_u128(100)), 1);
        index.reserve(AgentId::from_u128(1), &record);
        assert_eq!(index.occupancy(TaskKind::Harvest), 2);
        assert_eq!(index.node_load(ObjectId::from_u128(100)), 2);
    }

    #[test]
    fn expired_leases_are_not_indexed() {
        let mut snapshot = world();
        let buffer = ObjectId::from_u128(300);
        if let Some(first) = snapshot.agents.get_mut(0) {
            first.record.lease = Some(Lease {
                target: buffer,
                kind: LeaseKind::Acquire,
                expires_at: 15,
            });
        }
        if let Some(second) = snapshot.agents.get_mut(1) {
            second.record.lease = Some(Lease {
                target: buffer,
                kind: LeaseKind::Acquire,
                expires_at: 10,
            });
        }
        let index = CycleIndex::build(&snapshot);
        assert_eq!(index.leased_by_others(buffer, AgentId::from_u128(9)), 1);
        assert_eq!(index.leased_by_others(buffer, AgentId::from_u128(1)), 0);
    }
}
