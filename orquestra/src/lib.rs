//! Orquestra -- lifecycle orchestration and test facade.
//!
//! Wires the DI registry (`orquestra-core`), the BDD engine
//! (`orquestra-bdd`), and the shard event log (`orquestra-shard`) behind a
//! single [`Orquestra`] object.
//!
//! - [`bootstrap`] -- phased start/teardown and container ordering
//! - [`graph`] -- container dependency graph and cycle detection
//! - [`logging`] -- tracing subscriber setup

pub mod bootstrap;
pub mod facade;
pub mod graph;
pub mod logging;

pub use bootstrap::{BootstrapManager, BootstrapOptions, ContainerState};
pub use facade::{Orquestra, OrquestraBuilder};
pub use graph::DependencyGraph;

// Re-export the member crates so test suites depend on `orquestra` alone.
pub use orquestra_bdd;
pub use orquestra_core;
pub use orquestra_shard;
