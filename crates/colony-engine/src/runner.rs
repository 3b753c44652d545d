//! Cycle loop driving the engine against a world.
//!
//! Each cycle: run the engine on the current world, persist the records it
//! produced, write them back into the agents, and let the execution layer
//! act on them. The loop stops after `runtime.max_cycles` cycles.

use std::collections::BTreeSet;
use std::time::Duration;

use colony_core::{AssignmentEngine, CycleReport};
use colony_store::RecordStore;
use colony_types::{AgentId, WorldSnapshot};
use tracing::info;

use crate::error::EngineError;
use crate::execution::{Executor, StepOutcome};

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles executed.
    pub cycles: u64,
    /// New commitments made.
    pub commitments: u64,
    /// Agent-cycles spent idle.
    pub idle_agent_cycles: u64,
    /// Energy taken from nodes.
    pub harvested: u64,
    /// Energy fed into the controller.
    pub upgraded: u64,
    /// Sites completed.
    pub built: u32,
    /// Hostiles driven off.
    pub repelled: u32,
    /// The last cycle's report.
    pub last_report: Option<CycleReport>,
}

impl RunSummary {
    fn absorb(&mut self, report: CycleReport, outcome: StepOutcome) {
        self.cycles = self.cycles.saturating_add(1);
        self.commitments = self
            .commitments
            .saturating_add(u64::try_from(report.committed_count()).unwrap_or(u64::MAX));
        self.idle_agent_cycles = self
            .idle_agent_cycles
            .saturating_add(u64::try_from(report.idle_count()).unwrap_or(u64::MAX));
        self.harvested = self.harvested.saturating_add(outcome.harvested);
        self.upgraded = self.upgraded.saturating_add(outcome.upgraded);
        self.built = self.built.saturating_add(outcome.built);
        self.repelled = self.repelled.saturating_add(outcome.repelled);
        self.last_report = Some(report);
    }
}

/// Restore persisted records into `world`, dropping those of absent agents.
pub async fn restore_records<S: RecordStore>(
    world: &mut WorldSnapshot,
    store: &S,
) -> Result<usize, EngineError> {
    let alive: BTreeSet<AgentId> = world.agents.iter().map(|a| a.id).collect();
    let pruned = store.prune(&alive).await?;
    let records = store.load().await?;
    let mut restored = 0_usize;
    for agent in &mut world.agents {
        if let Some(record) = records.get(&agent.id) {
            agent.record = *record;
            restored = restored.saturating_add(1);
        }
    }
    info!(restored, pruned, "Agent records restored");
    Ok(restored)
}

/// Run the engine for its configured `runtime.max_cycles` cycles.
pub async fn run<S: RecordStore>(
    engine: &AssignmentEngine,
    world: &mut WorldSnapshot,
    store: &S,
) -> Result<RunSummary, EngineError> {
    let runtime = &engine.config().runtime;
    let mut executor = Executor::new();
    let mut summary = RunSummary::default();
    let interval = Duration::from_millis(runtime.cycle_interval_ms);

    for _ in 0..runtime.max_cycles {
        let report = engine.run_cycle(world);
        store.save(report.cycle, &report.records).await?;

        for agent in &mut world.agents {
            if let Some(record) = report.records.get(&agent.id) {
                agent.record = *record;
            }
        }
        let outcome = executor.step(world);
        summary.absorb(report, outcome);

        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    info!(
        cycles = summary.cycles,
        commitments = summary.commitments,
        idle_agent_cycles = summary.idle_agent_cycles,
        harvested = summary.harvested,
        upgraded = summary.upgraded,
        built = summary.built,
        repelled = summary.repelled,
        "Run finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use colony_core::ColonyConfig;
    use colony_core::config::RuntimeConfig;
    use colony_store::MemoryRecordStore;
    use colony_types::{AgentRecord, ObjectId, TaskKind, TaskStatus};

    use super::*;
    use crate::scenario::Scenario;

    const WORLD: &str = r"
development_level: 3
agents:
  - { id: 1, x: 10, y: 10, capabilities: [work, carry] }
  - { id: 2, x: 10, y: 11, capabilities: [work, carry] }
  - { id: 3, x: 11, y: 10, capabilities: [carry] }
nodes:
  - { id: 100, x: 6, y: 10, capacity: 3000, regen_per_cycle: 10 }
  - { id: 101, x: 14, y: 10, capacity: 3000, regen_per_cycle: 10 }
structures:
  - { id: 200, kind: controller, x: 10, y: 16 }
  - { id: 201, kind: spawn, x: 10, y: 8 }
";

    fn world() -> WorldSnapshot {
        Scenario::parse(WORLD)
            .map(Scenario::into_world)
            .unwrap_or_default()
    }

    fn engine(max_cycles: u64) -> AssignmentEngine {
        AssignmentEngine::new(ColonyConfig {
            runtime: RuntimeConfig {
                max_cycles,
                cycle_interval_ms: 0,
                ..RuntimeConfig::default()
            },
            ..ColonyConfig::default()
        })
    }

    #[tokio::test]
    async fn colony_makes_progress() {
        let engine = engine(60);
        let store = MemoryRecordStore::new();
        let mut world = world();

        let summary = run(&engine, &mut world, &store).await;
        let summary = summary.unwrap_or_default();

        assert_eq!(summary.cycles, 60);
        assert_eq!(world.cycle, 60);
        assert!(summary.harvested > 0);
        assert!(summary.upgraded > 0);
        // The last save belongs to the last cycle run.
        assert_eq!(store.last_cycle().await, 59);
        assert_eq!(store.load().await.map(|r| r.len()).ok(), Some(3));
    }

    #[tokio::test]
    async fn restore_prunes_and_applies_records() {
        let mut world = world();
        let kept = AgentRecord {
            task: Some(TaskKind::Harvest),
            target: Some(ObjectId::from_u128(100)),
            phase: Some(colony_types::Phase::Acquire),
            status: TaskStatus::Executing,
            cooldown_expiry: 50,
            lease: None,
        };
        let mut records = colony_store::RecordMap::new();
        records.insert(AgentId::from_u128(1), kept);
        records.insert(AgentId::from_u128(99), kept);
        let store = MemoryRecordStore::with_records(records);

        let restored = restore_records(&mut world, &store).await.unwrap_or_default();
        assert_eq!(restored, 1);
        assert_eq!(
            world.agent(AgentId::from_u128(1)).map(|a| a.record),
            Some(kept)
        );
        assert_eq!(store.load().await.map(|r| r.len()).ok(), Some(1));
    }
}
