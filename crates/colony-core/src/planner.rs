//! Concrete target selection for each task.
//!
//! Node-drawing work goes through the [`LoadBalancer`]. Withdrawals from and
//! deposits into buffers are ranked here and backed by a lease. A full
//! harvester unloads into a buffer near its source instead of drawing again. Everything
//! else picks the nearest qualifying object. All rankings end on the object
//! id, so results never depend on snapshot order.

use colony_types::{AgentView, LeaseKind, ObjectId, Phase, TaskKind, WorldSnapshot};

use crate::balancer::LoadBalancer;
use crate::config::ColonyConfig;
use crate::index::CycleIndex;
use crate::targets;

/// A target chosen for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// The chosen object.
    pub target: ObjectId,
    /// What the agent does there.
    pub phase: Phase,
    /// Lease to take on the target, if it is a depleting buffer.
    pub lease: Option<LeaseKind>,
}

impl Plan {
    const fn direct(target: ObjectId, phase: Phase) -> Self {
        Self {
            target,
            phase,
            lease: None,
        }
    }

    const fn leased(target: ObjectId, phase: Phase, kind: LeaseKind) -> Self {
        Self {
            target,
            phase,
            lease: Some(kind),
        }
    }
}

/// Picks targets against one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TargetPlanner<'a> {
    snapshot: &'a WorldSnapshot,
    config: &'a ColonyConfig,
    balancer: LoadBalancer,
}

impl<'a> TargetPlanner<'a> {
    /// Create a planner for this cycle.
    pub const fn new(snapshot: &'a WorldSnapshot, config: &'a ColonyConfig) -> Self {
        Self {
            snapshot,
            config,
            balancer: LoadBalancer::new(config.engine.load_weight),
        }
    }

    /// Choose a target for `agent` on `task`, or `None` if nothing qualifies.
    pub fn plan(&self, agent: &AgentView, task: TaskKind, index: &CycleIndex) -> Option<Plan> {
        let holding = !agent.store.is_empty();
        match task {
            TaskKind::Harvest if agent.store.is_full() => self.drop_off(agent, index),
            TaskKind::Harvest => self
                .node(agent, index)
                .map(|id| Plan::direct(id, Phase::Acquire)),
            TaskKind::Defense => self
                .nearest_hostile(agent)
                .map(|id| Plan::direct(id, Phase::Engage)),
            TaskKind::Upgrade if holding => self
                .snapshot
                .controller()
                .map(|c| Plan::direct(c.id, Phase::Deliver)),
            TaskKind::Upgrade => self
                .buffer(agent, task, index)
                .or_else(|| self.node(agent, index).map(|id| Plan::direct(id, Phase::Acquire))),
            TaskKind::Build if holding => self
                .construction_site(agent)
                .map(|id| Plan::direct(id, Phase::Deliver)),
            TaskKind::Repair if holding => self
                .repair_target(agent)
                .map(|id| Plan::direct(id, Phase::Deliver)),
            TaskKind::Store if holding => self.deposit(agent, index),
            TaskKind::Build | TaskKind::Repair | TaskKind::Store => {
                self.buffer(agent, task, index)
            }
        }
    }

    fn node(&self, agent: &AgentView, index: &CycleIndex) -> Option<ObjectId> {
        self.balancer
            .best_node(agent, &self.snapshot.nodes, index)
            .map(|n| n.id)
    }

    fn nearest_hostile(&self, agent: &AgentView) -> Option<ObjectId> {
        self.snapshot
            .hostiles
            .iter()
            .min_by_key(|h| (agent.position.range_to(h.position), h.id))
            .map(|h| h.id)
    }

    /// Supply buffer to withdraw from, backed by an acquire lease.
    ///
    /// Buffers nobody else has leased come first, then the task's preferred
    /// kinds, then the nearest.
    fn buffer(&self, agent: &AgentView, task: TaskKind, index: &CycleIndex) -> Option<Plan> {
        if agent.store.free() == 0 {
            return None;
        }
        let min = self.config.engine.min_extractable;
        self.snapshot
            .structures
            .iter()
            .filter(|s| targets::is_supply_buffer(s, min))
            .filter_map(|s| {
                let tier = targets::supply_tier(task, s)?;
                let key = (
                    index.leased_by_others(s.id, agent.id),
                    tier,
                    agent.position.range_to(s.position),
                    s.id,
                );
                Some((key, s.id))
            })
            .min_by_key(|(key, _)| *key)
            .map(|(_, id)| Plan::leased(id, Phase::Acquire, LeaseKind::Acquire))
    }

    /// Fill target to deposit into, backed by a deposit lease.
    ///
    /// Spawns and extensions are filled before towers, and towers before
    /// stockpiles.
    fn deposit(&self, agent: &AgentView, index: &CycleIndex) -> Option<Plan> {
        let thresholds = &self.config.thresholds;
        self.snapshot
            .structures
            .iter()
            .filter_map(|s| {
                let tier = targets::fill_tier(s, thresholds)?;
                let key = (
                    tier,
                    index.leased_by_others(s.id, agent.id),
                    agent.position.range_to(s.position),
                    s.id,
                );
                Some((key, s.id))
            })
            .min_by_key(|(key, _)| *key)
            .map(|(_, id)| Plan::leased(id, Phase::Deliver, LeaseKind::Deposit))
    }

    /// Where a full harvester unloads, backed by a deposit lease.
    fn drop_off(&self, agent: &AgentView, index: &CycleIndex) -> Option<Plan> {
        self.snapshot
            .structures
            .iter()
            .filter_map(|s| {
                let tier = targets::sink_tier(s)?;
                let key = (
                    tier,
                    index.leased_by_others(s.id, agent.id),
                    agent.position.range_to(s.position),
                    s.id,
                );
                Some((key, s.id))
            })
            .min_by_key(|(key, _)| *key)
            .map(|(_, id)| Plan::leased(id, Phase::Deliver, LeaseKind::Deposit))
    }

    fn construction_site(&self, agent: &AgentView) -> Option<ObjectId> {
        self.snapshot
            .sites
            .iter()
            .min_by_key(|s| (!s.kind.is_core(), agent.position.range_to(s.position), s.id))
            .map(|s| s.id)
    }

    /// Nearest damaged ordinary structure, else nearest weakened
    /// fortification.
    fn repair_target(&self, agent: &AgentView) -> Option<ObjectId> {
        let thresholds = &self.config.thresholds;
        let nearest = |fortification: bool| {
            self.snapshot
                .structures
                .iter()
                .filter(|s| s.kind.is_fortification() == fortification)
                .filter(|s| targets::needs_repair(s, thresholds))
                .min_by_key(|s| (agent.position.range_to(s.position), s.id))
                .map(|s| s.id)
        };
        nearest(false).or_else(|| nearest(true))
    }
}
