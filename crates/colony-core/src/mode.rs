//! Mode classification.
//!
//! The mode is derived from snapshot facts at the start of every cycle and
//! never persisted. First match wins: hostiles, then development level,
//! then stockpile size.

use colony_types::{Mode, WorldSnapshot};

use crate::config::ModeConfig;

/// Classify the colony's situation for this cycle.
pub fn classify(snapshot: &WorldSnapshot, config: &ModeConfig) -> Mode {
    if !snapshot.hostiles.is_empty() {
        return Mode::Emergency;
    }
    if snapshot.development_level < config.bootstrap_below_level {
        return Mode::Bootstrap;
    }
    if snapshot.stockpile() > config.economy_stockpile {
        return Mode::Economy;
    }
    Mode::Normal
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use colony_types::{Hostile, ObjectId, Position, Structure, StructureKind};

    use super::*;

    fn storage(stored: u32) -> Structure {
        Structure {
            id: ObjectId::from_u128(90),
            kind: StructureKind::Storage,
            position: Position::new(10, 10),
            stored,
            capacity: 1_000_000,
            hits: 10_000,
            hits_max: 10_000,
            owned: true,
            anchors: BTreeSet::new(),
        }
    }

    fn snapshot(level: u32) -> WorldSnapshot {
        WorldSnapshot {
            cycle: 1,
            development_level: level,
            ..WorldSnapshot::default()
        }
    }

    #[test]
    fn hostiles_outrank_everything() {
        let mut world = snapshot(1);
        world.structures.push(storage(50_000));
        world.hostiles.push(Hostile {
            id: ObjectId::from_u128(1),
            position: Position::new(0, 0),
        });
        assert_eq!(classify(&world, &ModeConfig::default()), Mode::Emergency);
    }

    #[test]
    fn low_level_is_bootstrap() {
        assert_eq!(classify(&snapshot(2), &ModeConfig::default()), Mode::Bootstrap);
        assert_eq!(classify(&snapshot(3), &ModeConfig::default()), Mode::Normal);
    }

    #[test]
    fn large_stockpile_is_economy() {
        let mut world = snapshot(5);
        world.structures.push(storage(10_000));
        assert_eq!(classify(&world, &ModeConfig::default()), Mode::Normal);
        world.structures = vec![storage(10_001)];
        assert_eq!(classify(&world, &ModeConfig::default()), Mode::Economy);
    }
}
