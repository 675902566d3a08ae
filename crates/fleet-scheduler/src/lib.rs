//! fleet-scheduler: cluster-aware job placement for fleet
//!
//! This crate decides where jobs run and sends them there:
//! - Capacity estimation and per-node scoring
//! - Greedy placement over a cluster registry snapshot
//! - Tier-checked job dispatch
//! - Fleet-wide statistics

pub mod capacity;
pub mod dispatcher;
pub mod placement;
pub mod registry;
pub mod scoring;
pub mod telemetry;

pub use dispatcher::JobDispatcher;
pub use placement::{PlacementEngine, PlacementStrategy, ScoredPlacement};
pub use registry::{ClusterRegistry, InMemoryRegistry};
pub use scoring::score_cluster;
pub use telemetry::{cluster_stats, ClusterStats};
