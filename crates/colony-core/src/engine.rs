//! The per-cycle assignment engine.
//!
//! For every agent, in ascending id order:
//!
//! 1. Drop a lease that has lapsed or whose predicate failed. If it backed
//!    the commitment, the commitment goes with it.
//! 2. Revalidate the commitment with the [`CooldownGuard`]. A valid one is
//!    reaffirmed and the agent is done. A finished phase moves on to the
//!    same task's next phase while the cooldown still runs.
//! 3. Walk the scheduler's open tasks in rank order and commit to the first
//!    one the planner finds a target for.
//! 4. With no target anywhere, leave the agent idle. Idle agents get no
//!    cooldown and are retried next cycle.
//!
//! The cycle index is updated as agents are processed, so an agent cleared
//! early in the pass frees its slot for agents after it.

use colony_types::{AgentId, AgentRecord, AgentView, TaskKind, TaskStatus, WorldSnapshot};

use crate::config::ColonyConfig;
use crate::cooldown::{CooldownGuard, Verdict};
use crate::index::CycleIndex;
use crate::lease::LeaseManager;
use crate::mode;
use crate::planner::{Plan, TargetPlanner};
use crate::report::{CycleReport, Decision, Note};
use crate::scheduler::TaskScheduler;

/// Orchestrates guard, scheduler, balancer, and leases for a whole cycle.
#[derive(Debug, Clone)]
pub struct AssignmentEngine {
    config: ColonyConfig,
}

/// Components shared by every agent in one cycle.
struct CycleContext<'a> {
    snapshot: &'a WorldSnapshot,
    guard: CooldownGuard<'a>,
    leases: LeaseManager,
    scheduler: TaskScheduler,
    planner: TargetPlanner<'a>,
    index: CycleIndex,
    notes: Vec<Note>,
}

impl AssignmentEngine {
    /// Create an engine with the given configuration.
    pub const fn new(config: ColonyConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub const fn config(&self) -> &ColonyConfig {
        &self.config
    }

    /// Assign every agent in `snapshot` for this cycle.
    pub fn run_cycle(&self, snapshot: &WorldSnapshot) -> CycleReport {
        let mode = mode::classify(snapshot, &self.config.modes);
        let mut ctx = CycleContext {
            snapshot,
            guard: CooldownGuard::new(&self.config),
            leases: LeaseManager::new(&self.config.engine),
            scheduler: TaskScheduler::new(&self.config, mode, snapshot),
            planner: TargetPlanner::new(snapshot, &self.config),
            index: CycleIndex::build(snapshot),
            notes: Vec::new(),
        };

        let mut agents: Vec<&AgentView> = snapshot.agents.iter().collect();
        agents.sort_by_key(|a| a.id);

        let mut report = CycleReport::new(snapshot.cycle, mode);
        for agent in agents {
            let (record, decision) = ctx.assign(agent);
            report.records.insert(agent.id, record);
            report.decisions.insert(agent.id, decision);
        }

        report.occupancy = ctx
            .index
            .task_counts()
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(task, count)| (*task, *count))
            .collect();
        report.notes = ctx.notes;
        report.log_summary();
        report
    }
}

/// What revalidation left of a commitment.
enum Revalidation {
    /// Still valid, nothing to do.
    Kept(Decision),
    /// The phase is done. Carries the commitment as it was.
    Finished(AgentRecord),
    /// Dropped, the agent re-plans from scratch.
    Cleared,
}

impl CycleContext<'_> {
    fn assign(&mut self, agent: &AgentView) -> (AgentRecord, Decision) {
        let mut record = agent.record;
        self.drop_stale_lease(agent, &mut record);

        if record.is_committed() {
            match self.revalidate(agent, &mut record) {
                Revalidation::Kept(decision) => return (record, decision),
                Revalidation::Finished(previous) => {
                    if let Some(next) = self.next_phase(agent, &previous) {
                        return next;
                    }
                }
                Revalidation::Cleared => {}
            }
        } else {
            // Idle or half-written: only a lease can still be counted.
            self.index.release(agent.id, &record);
            record.clear();
        }

        let saturated = self.scheduler.saturated_tasks(&self.index);
        let (record, decision) = self.replan(agent, record);
        self.note_saturated(agent, &saturated, decision);
        (record, decision)
    }

    fn drop_stale_lease(&mut self, agent: &AgentView, record: &mut AgentRecord) {
        let Some(lease) = record.lease else {
            return;
        };
        if self.leases.is_valid(agent, &lease, self.snapshot) {
            return;
        }

        let backs_commitment = record.is_committed() && record.target == Some(lease.target);
        if backs_commitment
            && self.guard.check(agent, record, self.snapshot) == Verdict::TaskFinished
        {
            // The store filled or emptied; revalidation reports it as finished.
            self.index.release_lease(agent.id, record);
            record.lease = None;
            return;
        }

        tracing::debug!(
            cycle = self.snapshot.cycle,
            agent = %agent.id,
            target = %lease.target,
            "Lease dropped"
        );
        self.notes.push(Note::StaleLease {
            agent: agent.id,
            target: lease.target,
        });

        if backs_commitment {
            self.index.release(agent.id, record);
            record.clear();
        } else {
            self.index.release_lease(agent.id, record);
            record.lease = None;
        }
    }

    /// Keep a still-valid commitment, or clear it and report why.
    fn revalidate(&mut self, agent: &AgentView, record: &mut AgentRecord) -> Revalidation {
        let previous = *record;
        let (Some(task), Some(target)) = (record.task, record.target) else {
            self.index.release(agent.id, record);
            record.clear();
            return Revalidation::Cleared;
        };
        let verdict = self.guard.check(agent, record, self.snapshot);
        let note = match verdict {
            Verdict::Valid => {
                tracing::debug!(
                    cycle = self.snapshot.cycle,
                    agent = %agent.id,
                    task = task.as_str(),
                    target = %target,
                    "Commitment reaffirmed"
                );
                return Revalidation::Kept(Decision::Reaffirmed { task, target });
            }
            Verdict::TargetInvalidated => {
                tracing::info!(
                    cycle = self.snapshot.cycle,
                    agent = %agent.id,
                    task = task.as_str(),
                    target = %target,
                    "Target invalidated, re-planning"
                );
                Note::TargetInvalidated { agent: agent.id, task, target }
            }
            Verdict::TaskFinished => Note::TaskFinished { agent: agent.id, task, target },
            Verdict::CooldownExpired => Note::CooldownExpired { agent: agent.id, task, target },
        };
        self.notes.push(note);
        self.index.release(agent.id, record);
        record.clear();
        if verdict == Verdict::TaskFinished {
            Revalidation::Finished(previous)
        } else {
            Revalidation::Cleared
        }
    }

    /// Move a finished phase on to the same task's next phase, as long as
    /// the original cooldown still runs. The expiry is carried over.
    fn next_phase(
        &mut self,
        agent: &AgentView,
        previous: &AgentRecord,
    ) -> Option<(AgentRecord, Decision)> {
        let task = previous.task?;
        if self.snapshot.cycle > previous.cooldown_expiry
            || !self.scheduler.has_room(task, &self.index)
        {
            return None;
        }
        let plan = self.planner.plan(agent, task, &self.index)?;
        let record = self.commit(agent, task, plan, previous.cooldown_expiry);

        tracing::info!(
            cycle = self.snapshot.cycle,
            agent = %agent.id,
            task = task.as_str(),
            target = %plan.target,
            phase = ?plan.phase,
            "Phase continued"
        );
        Some((
            record,
            Decision::Committed {
                task,
                target: plan.target,
                phase: plan.phase,
            },
        ))
    }

    /// Note full tasks the agent qualifies for and would have ranked ahead
    /// of whatever it ended up with.
    fn note_saturated(&mut self, agent: &AgentView, saturated: &[TaskKind], decision: Decision) {
        let cutoff = decision
            .assignment()
            .and_then(|(task, _)| self.scheduler.rank(task));
        for &task in saturated {
            let ahead =
                cutoff.is_none_or(|cutoff| self.scheduler.rank(task).is_some_and(|r| r < cutoff));
            if ahead && self.scheduler.accepts(task, agent) {
                tracing::debug!(
                    cycle = self.snapshot.cycle,
                    agent = %agent.id,
                    task = task.as_str(),
                    "Task at capacity"
                );
                self.notes.push(Note::CapacityExhausted { agent: agent.id, task });
            }
        }
    }

    fn replan(&mut self, agent: &AgentView, mut record: AgentRecord) -> (AgentRecord, Decision) {
        let now = self.snapshot.cycle;
        let mut missed: Vec<TaskKind> = Vec::new();

        for open in self.scheduler.ranked_open_tasks(&self.index) {
            if !self.scheduler.accepts(open.kind, agent) {
                continue;
            }
            let Some(plan) = self.planner.plan(agent, open.kind, &self.index) else {
                missed.push(open.kind);
                continue;
            };

            let expiry = self.guard.next_expiry(record.cooldown_expiry, now);
            let record = self.commit(agent, open.kind, plan, expiry);
            self.note_missed(agent.id, &missed);

            tracing::info!(
                cycle = now,
                agent = %agent.id,
                task = open.kind.as_str(),
                target = %plan.target,
                remaining = open.remaining.saturating_sub(1),
                "Commitment made"
            );
            return (
                record,
                Decision::Committed {
                    task: open.kind,
                    target: plan.target,
                    phase: plan.phase,
                },
            );
        }

        self.note_missed(agent.id, &missed);
        record.clear();
        if missed.is_empty() {
            tracing::debug!(cycle = now, agent = %agent.id, "No open task, idling");
        } else {
            tracing::warn!(
                cycle = now,
                agent = %agent.id,
                tasks = missed.len(),
                "No candidate target, idling"
            );
        }
        (record, Decision::Idle)
    }

    /// Write a fresh commitment, take its lease, and count it.
    fn commit(
        &mut self,
        agent: &AgentView,
        task: TaskKind,
        plan: Plan,
        cooldown_expiry: u64,
    ) -> AgentRecord {
        let mut record = AgentRecord {
            task: Some(task),
            target: Some(plan.target),
            phase: Some(plan.phase),
            status: TaskStatus::Executing,
            cooldown_expiry,
            lease: None,
        };
        if let Some(kind) = plan.lease {
            self.leases
                .try_acquire(&mut record, plan.target, kind, self.snapshot.cycle);
        }
        self.index.reserve(agent.id, &record);
        record
    }

    fn note_missed(&mut self, agent: AgentId, missed: &[TaskKind]) {
        self.notes
            .extend(missed.iter().map(|task| Note::NoCandidate { agent, task: *task }));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use colony_types::{
        Capability, CarryStore, Hostile, Lease, LeaseKind, Mode, ObjectId, Phase, Position,
        ResourceNode, Structure, StructureKind,
    };

    use super::*;

    const NODE: ObjectId = ObjectId::from_u128(100);
    const CONTROLLER: ObjectId = ObjectId::from_u128(200);
    const CONTAINER: ObjectId = ObjectId::from_u128(300);

    fn worker(id: u128, used: u32) -> AgentView {
        AgentView {
            id: AgentId::from_u128(id),
            position: Position::new(0, 0),
            store: CarryStore::new(used, 50),
            capabilities: [Capability::Work, Capability::Carry].into_iter().collect(),
            record: AgentRecord::default(),
        }
    }

    fn owned(id: ObjectId, kind: StructureKind, stored: u32, capacity: u32) -> Structure {
        Structure {
            id,
            kind,
            position: Position::new(4, 4),
            stored,
            capacity,
            hits: 1_000,
            hits_max: 1_000,
            owned: true,
            anchors: BTreeSet::new(),
        }
    }

    fn colony(cycle: u64) -> WorldSnapshot {
        WorldSnapshot {
            cycle,
            development_level: 4,
            energy_available: 300,
            nodes: vec![ResourceNode {
                id: NODE,
                position: Position::new(2, 2),
                remaining: 2_000,
                capacity: 3_000,
                regen_per_cycle: 10,
                valid: true,
            }],
            structures: vec![owned(CONTROLLER, StructureKind::Controller, 0, 0)],
            ..WorldSnapshot::default()
        }
    }

    #[test]
    fn empty_world_produces_empty_report() {
        let engine = AssignmentEngine::new(ColonyConfig::default());
        let report = engine.run_cycle(&WorldSnapshot::default());
        assert!(report.decisions.is_empty());
        assert!(report.notes.is_empty());
        assert_eq!(report.mode, Mode::Bootstrap);
    }

    #[test]
    fn commitment_sets_cooldown_and_occupancy() {
        let engine = AssignmentEngine::new(ColonyConfig::default());
        let mut world = colony(10);
        world.agents.push(worker(1, 0));
        let report = engine.run_cycle(&world);

        // Upgrade outranks harvest; with no buffers it draws from the node.
        assert_eq!(
            report.assignment(AgentId::from_u128(1)),
            Some((TaskKind::Upgrade, NODE))
        );
        let record = report.records.get(&AgentId::from_u128(1)).copied().unwrap_or_default();
        assert_eq!(record.cooldown_expiry, 60);
        assert_eq!(record.phase, Some(Phase::Acquire));
        assert_eq!(report.occupancy.get(&TaskKind::Upgrade), Some(&1));
    }

    #[test]
    fn stale_lease_backing_commitment_forces_replan() {
        let engine = AssignmentEngine::new(ColonyConfig::default());
        let mut world = colony(20);
        world
            .structures
            .push(owned(CONTAINER, StructureKind::Container, 0, 2_000));
        let mut agent = worker(1, 0);
        agent.record = AgentRecord {
            task: Some(TaskKind::Upgrade),
            target: Some(CONTAINER),
            phase: Some(Phase::Acquire),
            status: TaskStatus::Executing,
            cooldown_expiry: 60,
            lease: Some(Lease {
                target: CONTAINER,
                kind: LeaseKind::Acquire,
                expires_at: 25,
            }),
        };
        world.agents.push(agent);

        let report = engine.run_cycle(&world);
        // The container ran dry, so the lease is stale and the agent moves
        // to the node. The cooldown is not rolled back.
        assert!(report.notes.contains(&Note::StaleLease {
            agent: AgentId::from_u128(1),
            target: CONTAINER,
        }));
        assert_eq!(
            report.assignment(AgentId::from_u128(1)),
            Some((TaskKind::Upgrade, NODE))
        );
        let record = report.records.get(&AgentId::from_u128(1)).copied().unwrap_or_default();
        assert_eq!(record.cooldown_expiry, 70);
        assert!(record.lease.is_none());
    }

    #[test]
    fn finished_harvest_moves_to_delivery() {
        let engine = AssignmentEngine::new(ColonyConfig::default());
        let mut world = colony(30);
        let mut agent = worker(1, 50);
        agent.record = AgentRecord {
            task: Some(TaskKind::Harvest),
            target: Some(NODE),
            phase: Some(Phase::Acquire),
            status: TaskStatus::Executing,
            cooldown_expiry: 60,
            lease: None,
        };
        world.agents.push(agent);

        let report = engine.run_cycle(&world);
        assert!(report.notes.contains(&Note::TaskFinished {
            agent: AgentId::from_u128(1),
            task: TaskKind::Harvest,
            target: NODE,
        }));
        assert_eq!(
            report.decisions.get(&AgentId::from_u128(1)),
            Some(&Decision::Committed {
                task: TaskKind::Upgrade,
                target: CONTROLLER,
                phase: Phase::Deliver,
            })
        );
    }

    #[test]
    fn defenders_engage_nearest_hostile() {
        let engine = AssignmentEngine::new(ColonyConfig::default());
        let mut world = colony(5);
        world.hostiles = vec![
            Hostile {
                id: ObjectId::from_u128(901),
                position: Position::new(10, 10),
            },
            Hostile {
                id: ObjectId::from_u128(902),
                position: Position::new(3, 3),
            },
        ];
        let mut guard = worker(1, 0);
        guard.capabilities = [Capability::Attack].into_iter().collect();
        world.agents.push(guard);

        let report = engine.run_cycle(&world);
        assert_eq!(report.mode, Mode::Emergency);
        assert_eq!(
            report.decisions.get(&AgentId::from_u128(1)),
            Some(&Decision::Committed {
                task: TaskKind::Defense,
                target: ObjectId::from_u128(902),
                phase: Phase::Engage,
            })
        );
    }

    #[test]
    fn saturated_task_is_noted_for_qualified_agents() {
        let config = ColonyConfig::default();
        let engine = AssignmentEngine::new(config);
        let mut world = colony(12);
        // Drop the controller so only harvest is executable.
        world.structures.clear();
        for id in 1..=5 {
            world.agents.push(worker(id, 0));
        }
        let report = engine.run_cycle(&world);
        assert_eq!(report.agents_on(TaskKind::Harvest), 4);
        assert_eq!(
            report.decisions.get(&AgentId::from_u128(5)),
            Some(&Decision::Idle)
        );
        assert!(report.notes.contains(&Note::CapacityExhausted {
            agent: AgentId::from_u128(5),
            task: TaskKind::Harvest,
        }));
    }
}
