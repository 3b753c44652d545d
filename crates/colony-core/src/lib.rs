//! Per-cycle task and target assignment for a colony of agents.
//!
//! Each cycle the environment hands the engine a [`WorldSnapshot`]. The
//! engine decides, for every agent, which task it works on and which node or
//! structure it works at, and writes the result into the agent's persisted
//! record. Commitments are held stable by a cooldown, spread across nodes by
//! load, and dropped immediately when their target stops qualifying.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `colony-config.yaml` into
//!   strongly-typed structs.
//! - [`mode`] -- Situational mode classification.
//! - [`index`] -- Cycle-scoped occupancy index.
//! - [`targets`] -- Target predicates shared across components.
//! - [`cooldown`] -- [`CooldownGuard`]: commitment revalidation.
//! - [`scheduler`] -- [`TaskScheduler`]: task ranking and capacity.
//! - [`balancer`] -- [`LoadBalancer`]: load-aware node choice.
//! - [`lease`] -- [`LeaseManager`]: short-lived buffer leases.
//! - [`planner`] -- Per-task target selection.
//! - [`engine`] -- [`AssignmentEngine`]: the per-cycle orchestration.
//! - [`report`] -- [`CycleReport`] and its decisions and notes.
//!
//! [`WorldSnapshot`]: colony_types::WorldSnapshot

pub mod balancer;
pub mod config;
pub mod cooldown;
pub mod engine;
pub mod index;
pub mod lease;
pub mod mode;
pub mod planner;
pub mod report;
pub mod scheduler;
pub mod targets;

pub use balancer::LoadBalancer;
pub use config::{ColonyConfig, ConfigError};
pub use cooldown::{CooldownGuard, Verdict};
pub use engine::AssignmentEngine;
pub use index::CycleIndex;
pub use lease::LeaseManager;
pub use planner::{Plan, TargetPlanner};
pub use report::{CycleReport, Decision, Note};
pub use scheduler::{OpenTask, TaskScheduler, TaskTable};
