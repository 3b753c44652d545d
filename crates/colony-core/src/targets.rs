//! Target predicates shared by the scheduler, the planner, and the guard.
//!
//! A target that the planner would select must also pass
//! [`target_is_valid`] on the next cycle, otherwise a fresh commitment would
//! be invalidated immediately. Keeping every predicate in one place is what
//! holds that together.

use colony_types::{Anchor, ObjectId, Phase, Structure, StructureKind, TaskKind, WorldSnapshot};

use crate::config::{ColonyConfig, ThresholdConfig};

/// An owned buffer holding more than `min_extractable`.
pub fn is_supply_buffer(structure: &Structure, min_extractable: u32) -> bool {
    structure.owned
        && matches!(
            structure.kind,
            StructureKind::Container | StructureKind::Storage | StructureKind::Link
        )
        && structure.stored > min_extractable
}

/// Preference tier of a buffer when `task` withdraws from it, lower first.
///
/// `None` means the task never draws from this kind of buffer.
pub fn supply_tier(task: TaskKind, structure: &Structure) -> Option<u8> {
    let link_near = |anchor| structure.kind == StructureKind::Link && structure.is_near(anchor);
    match task {
        // Storage is where haulers unload, never where they load.
        TaskKind::Store => {
            if link_near(Anchor::Spawn) {
                Some(0)
            } else if structure.kind == StructureKind::Container {
                Some(1)
            } else {
                None
            }
        }
        TaskKind::Upgrade => {
            if link_near(Anchor::Controller) {
                Some(1)
            } else {
                match structure.kind {
                    StructureKind::Container => Some(0),
                    StructureKind::Storage => Some(2),
                    _ => None,
                }
            }
        }
        TaskKind::Build | TaskKind::Repair => {
            if link_near(Anchor::Spawn) {
                Some(0)
            } else {
                match structure.kind {
                    StructureKind::Storage => Some(1),
                    StructureKind::Container => Some(2),
                    _ => None,
                }
            }
        }
        TaskKind::Harvest | TaskKind::Defense => None,
    }
}

/// Preference tier of a structure as a hauler's deposit target, lower first.
///
/// Spawns and extensions come first, then towers with more than the refill
/// margin free, then storage. A buffer haulers withdraw from is never a
/// deposit target.
pub fn fill_tier(structure: &Structure, thresholds: &ThresholdConfig) -> Option<u8> {
    if !accepts_deposit(structure) {
        return None;
    }
    match structure.kind {
        StructureKind::Spawn | StructureKind::Extension => Some(0),
        StructureKind::Tower if structure.free() > thresholds.tower_refill_margin => Some(1),
        StructureKind::Storage => Some(2),
        _ => None,
    }
}

/// A hauler's deposit target that can still take energy.
///
/// Looser than [`fill_tier`] so a tower being topped up stays valid past
/// the refill margin.
fn accepts_deposit(structure: &Structure) -> bool {
    structure.owned
        && structure.free() > 0
        && supply_tier(TaskKind::Store, structure).is_none()
        && matches!(
            structure.kind,
            StructureKind::Spawn
                | StructureKind::Extension
                | StructureKind::Tower
                | StructureKind::Storage
        )
}

/// Preference tier of a structure as a harvester's drop-off, lower first.
///
/// Links next to a source come first, then containers next to a source,
/// then any other container, then storage.
pub fn sink_tier(structure: &Structure) -> Option<u8> {
    if !structure.owned || structure.free() == 0 {
        return None;
    }
    let at_source = structure.is_near(Anchor::Source);
    match structure.kind {
        StructureKind::Link if at_source => Some(0),
        StructureKind::Container if at_source => Some(1),
        StructureKind::Container => Some(2),
        StructureKind::Storage => Some(3),
        _ => None,
    }
}

/// Damaged enough to be picked for repair.
pub fn needs_repair(structure: &Structure, thresholds: &ThresholdConfig) -> bool {
    let percent = if structure.kind.is_fortification() {
        thresholds.fortification_repair_percent
    } else {
        thresholds.repair_percent
    };
    structure.owned && structure.is_below(percent)
}

/// Whether a committed target still belongs to the candidate set of its
/// task and phase.
///
/// Acquisition targets only need to still have supply. Delivery targets
/// need to still accept what the task delivers.
pub fn target_is_valid(
    task: TaskKind,
    phase: Phase,
    target: ObjectId,
    snapshot: &WorldSnapshot,
    config: &ColonyConfig,
) -> bool {
    let min = config.engine.min_extractable;
    match (task, phase) {
        (TaskKind::Defense, _) => snapshot.hostile(target).is_some(),
        (_, Phase::Acquire) => {
            let node_ok = task.draws_from_nodes()
                && snapshot.node(target).is_some_and(|n| n.is_harvestable());
            node_ok
                || snapshot.structure(target).is_some_and(|s| {
                    supply_tier(task, s).is_some() && is_supply_buffer(s, min)
                })
        }
        (TaskKind::Upgrade, _) => snapshot
            .structure(target)
            .is_some_and(|s| s.kind == StructureKind::Controller && s.owned),
        (TaskKind::Build, _) => snapshot.site(target).is_some(),
        (TaskKind::Repair, _) => snapshot
            .structure(target)
            .is_some_and(|s| s.owned && s.hits < s.hits_max),
        (TaskKind::Store, _) => snapshot.structure(target).is_some_and(accepts_deposit),
        (TaskKind::Harvest, _) => snapshot
            .structure(target)
            .is_some_and(|s| sink_tier(s).is_some()),
    }
}
