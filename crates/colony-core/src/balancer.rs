//! Load-balanced resource node selection.
//!
//! Every candidate node scores `load * weight + distance`, where load is the
//! number of node-drawing agents already committed to it this cycle. The
//! lowest score wins; equal scores go to the lowest node id. Nothing is
//! carried between cycles, so stale counts cannot accumulate.

use colony_types::{AgentView, ResourceNode};

use crate::index::CycleIndex;

/// Greedy node chooser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadBalancer {
    weight: u32,
}

impl LoadBalancer {
    /// Create a balancer where one committed agent costs `weight` tiles.
    pub const fn new(weight: u32) -> Self {
        Self { weight }
    }

    /// Score of `node` for `agent`, lower is better.
    pub fn score(&self, agent: &AgentView, node: &ResourceNode, index: &CycleIndex) -> u64 {
        let load = u64::from(index.node_load(node.id)).saturating_mul(u64::from(self.weight));
        let distance = u64::from(agent.position.range_to(node.position));
        load.saturating_add(distance)
    }

    /// Pick the best harvestable node among `candidates`.
    ///
    /// Returns `None` when no candidate is harvestable.
    pub fn best_node<'n, I>(
        &self,
        agent: &AgentView,
        candidates: I,
        index: &CycleIndex,
    ) -> Option<&'n ResourceNode>
    where
        I: IntoIterator<Item = &'n ResourceNode>,
    {
        candidates
            .into_iter()
            .filter(|node| node.is_harvestable())
            .min_by_key(|node| (self.score(agent, node, index), node.id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use colony_types::{
        AgentId, AgentRecord, CarryStore, ObjectId, Phase, Position, TaskKind, TaskStatus,
        WorldSnapshot,
    };

    use super::*;

    fn node(id: u128, x: u32) -> ResourceNode {
        ResourceNode {
            id: ObjectId::from_u128(id),
            position: Position::new(x, 0),
            remaining: 1_000,
            capacity: 3_000,
            regen_per_cycle: 10,
            valid: true,
        }
    }

    fn agent(id: u128, record: AgentRecord) -> AgentView {
        AgentView {
            id: AgentId::from_u128(id),
            position: Position::new(0, 0),
            store: CarryStore::new(0, 50),
            capabilities: BTreeSet::new(),
            record,
        }
    }

    fn on_node(id: u128) -> AgentRecord {
        AgentRecord {
            task: Some(TaskKind::Harvest),
            target: Some(ObjectId::from_u128(id)),
            phase: Some(Phase::Acquire),
            status: TaskStatus::Executing,
            cooldown_expiry: 100,
            lease: None,
        }
    }

    #[test]
    fn load_outweighs_short_distance() {
        let nodes = vec![node(1, 2), node(2, 5)];
        let world = WorldSnapshot {
            cycle: 1,
            nodes: nodes.clone(),
            agents: vec![agent(9, on_node(1))],
            ..WorldSnapshot::default()
        };
        let index = CycleIndex::build(&world);
        let balancer = LoadBalancer::new(10);
        let requester = agent(10, AgentRecord::default());

        assert_eq!(balancer.score(&requester, &node(1, 2), &index), 12);
        assert_eq!(balancer.score(&requester, &node(2, 5), &index), 5);
        let best = balancer.best_node(&requester, &nodes, &index).map(|n| n.id);
        assert_eq!(best, Some(ObjectId::from_u128(2)));
    }

    #[test]
    fn equal_scores_pick_lowest_id() {
        let nodes = vec![node(8, 3), node(4, 3)];
        let index = CycleIndex::default();
        let best = LoadBalancer::new(10)
            .best_node(&agent(1, AgentRecord::default()), &nodes, &index)
            .map(|n| n.id);
        assert_eq!(best, Some(ObjectId::from_u128(4)));
    }

    #[test]
    fn exhausted_nodes_are_skipped() {
        let mut dry = node(1, 1);
        dry.remaining = 0;
        let mut gone = node(2, 1);
        gone.valid = false;
        let nodes = vec![dry, gone];
        let best = LoadBalancer::new(10).best_node(
            &agent(1, AgentRecord::default()),
            &nodes,
            &CycleIndex::default(),
        );
        assert!(best.is_none());
    }
}
