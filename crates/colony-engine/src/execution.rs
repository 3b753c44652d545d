//! Toy execution layer.
//!
//! Turns committed assignments into world changes so the engine sees the
//! consequences of its decisions on the next cycle. Agents next to their
//! target interact with it at a fixed rate; everyone else steps one tile
//! toward theirs. This is not a movement or combat model.

use std::collections::BTreeMap;

use colony_types::{
    AgentView, ObjectId, Phase, Position, Structure, StructureKind, TaskKind, WorldSnapshot,
};

use crate::scenario::{default_capacity, default_hits_max};

/// Units a node yields per adjacent agent per cycle.
const HARVEST_RATE: u32 = 10;
/// Energy spent per cycle on the controller, a site, or a repair.
const WORK_RATE: u32 = 5;
/// Hit points restored per unit of energy.
const REPAIR_HITS_PER_ENERGY: u32 = 100;
/// Energy a construction site absorbs before it becomes a structure.
const BUILD_COST: u32 = 100;
/// Controller energy needed per development level.
const LEVEL_COST: u64 = 2_000;

/// Mutable state the execution layer keeps between cycles.
#[derive(Debug, Default)]
pub struct Executor {
    build_progress: BTreeMap<ObjectId, u32>,
    upgrade_progress: u64,
}

/// What happened during one execution step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Energy taken from nodes.
    pub harvested: u64,
    /// Energy fed into the controller.
    pub upgraded: u64,
    /// Sites completed.
    pub built: u32,
    /// Hostiles driven off.
    pub repelled: u32,
}

impl Executor {
    /// Create an executor with no progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one cycle of work for every committed agent, then regenerate
    /// nodes and advance the cycle counter.
    pub fn step(&mut self, world: &mut WorldSnapshot) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        let mut agents = std::mem::take(&mut world.agents);
        agents.sort_by_key(|a| a.id);

        for agent in &mut agents {
            let record = agent.record;
            let (Some(task), Some(target), Some(phase)) = (record.task, record.target, record.phase)
            else {
                continue;
            };
            if !record.is_committed() {
                continue;
            }
            let Some(goal) = world.position_of(target) else {
                continue;
            };
            if agent.position.range_to(goal) > 1 {
                agent.position = step_toward(agent.position, goal);
                continue;
            }
            self.interact(world, agent, task, target, phase, &mut outcome);
        }

        world.agents = agents;
        for node in &mut world.nodes {
            node.remaining = node
                .remaining
                .saturating_add(node.regen_per_cycle)
                .min(node.capacity);
        }
        world.energy_available = spawn_energy(world);
        world.cycle = world.cycle.saturating_add(1);
        outcome
    }

    fn interact(
        &mut self,
        world: &mut WorldSnapshot,
        agent: &mut AgentView,
        task: TaskKind,
        target: ObjectId,
        phase: Phase,
        outcome: &mut StepOutcome,
    ) {
        match (task, phase) {
            (TaskKind::Defense, _) => {
                let before = world.hostiles.len();
                world.hostiles.retain(|h| h.id != target);
                if world.hostiles.len() < before {
                    outcome.repelled = outcome.repelled.saturating_add(1);
                }
            }
            (_, Phase::Acquire) => {
                if let Some(node) = world.nodes.iter_mut().find(|n| n.id == target) {
                    let amount = HARVEST_RATE.min(node.remaining).min(agent.store.free());
                    node.remaining = node.remaining.saturating_sub(amount);
                    agent.store.used = agent.store.used.saturating_add(amount);
                    outcome.harvested = outcome.harvested.saturating_add(u64::from(amount));
                } else if let Some(buffer) = structure_mut(world, target) {
                    let amount = buffer.stored.min(agent.store.free());
                    buffer.stored = buffer.stored.saturating_sub(amount);
                    agent.store.used = agent.store.used.saturating_add(amount);
                }
            }
            (TaskKind::Store | TaskKind::Harvest, _) => {
                if let Some(sink) = structure_mut(world, target) {
                    let amount = agent.store.used.min(sink.free());
                    sink.stored = sink.stored.saturating_add(amount);
                    agent.store.used = agent.store.used.saturating_sub(amount);
                }
            }
            (TaskKind::Upgrade, _) => {
                let amount = spend(agent);
                outcome.upgraded = outcome.upgraded.saturating_add(u64::from(amount));
                self.upgrade_progress = self.upgrade_progress.saturating_add(u64::from(amount));
                if self.upgrade_progress >= LEVEL_COST {
                    self.upgrade_progress = self.upgrade_progress.saturating_sub(LEVEL_COST);
                    world.development_level = world.development_level.saturating_add(1);
                    tracing::info!(level = world.development_level, "Development level raised");
                }
            }
            (TaskKind::Build, _) => {
                let amount = spend(agent);
                let progress = self.build_progress.entry(target).or_insert(0);
                *progress = progress.saturating_add(amount);
                if *progress >= BUILD_COST {
                    self.build_progress.remove(&target);
                    if complete_site(world, target) {
                        outcome.built = outcome.built.saturating_add(1);
                    }
                }
            }
            (TaskKind::Repair, _) => {
                let amount = spend(agent);
                if let Some(damaged) = structure_mut(world, target) {
                    let restored = amount.saturating_mul(REPAIR_HITS_PER_ENERGY);
                    damaged.hits = damaged.hits.saturating_add(restored).min(damaged.hits_max);
                }
            }
        }
    }
}

/// Energy held by owned spawns and extensions.
pub fn spawn_energy(world: &WorldSnapshot) -> u32 {
    world
        .structures
        .iter()
        .filter(|s| s.owned && matches!(s.kind, StructureKind::Spawn | StructureKind::Extension))
        .fold(0_u32, |acc, s| acc.saturating_add(s.stored))
}

fn structure_mut(world: &mut WorldSnapshot, id: ObjectId) -> Option<&mut Structure> {
    world.structures.iter_mut().find(|s| s.id == id)
}

/// Take up to one cycle's worth of work energy from the agent.
fn spend(agent: &mut AgentView) -> u32 {
    let amount = WORK_RATE.min(agent.store.used);
    agent.store.used = agent.store.used.saturating_sub(amount);
    amount
}

/// Replace a finished site with its structure.
fn complete_site(world: &mut WorldSnapshot, site: ObjectId) -> bool {
    let Some(pos) = world.sites.iter().position(|s| s.id == site) else {
        return false;
    };
    let finished = world.sites.swap_remove(pos);
    let hits_max = default_hits_max(finished.kind);
    world.structures.push(Structure {
        id: finished.id,
        kind: finished.kind,
        position: finished.position,
        stored: 0,
        capacity: default_capacity(finished.kind),
        hits: hits_max,
        hits_max,
        owned: true,
        anchors: std::collections::BTreeSet::new(),
    });
    tracing::info!(site = %finished.id, kind = ?finished.kind, "Construction finished");
    true
}

/// One grid move from `from` toward `to`, diagonal allowed.
fn step_toward(from: Position, to: Position) -> Position {
    let axis = |a: u32, b: u32| match a.cmp(&b) {
        std::cmp::Ordering::Less => a.saturating_add(1),
        std::cmp::Ordering::Greater => a.saturating_sub(1),
        std::cmp::Ordering::Equal => a,
    };
    Position::new(axis(from.x, to.x), axis(from.y, to.y))
}
