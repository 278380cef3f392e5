//! E2E integration tests for the orquestra facade and bootstrap manager.
//!
//! These tests validate phase ordering, dependency-ordered container
//! start/stop, failure handling during teardown, and a full BDD run
//! recorded through the shard log, using mock components.
//!
//! # Test Structure
//!
//! - `helpers/` -- Shared test utilities (config builder, mock containers and components, assertions)
//! - `scenarios/` -- Test files organized by scenario
//!
//! # Running
//!
//! ```bash
//! cargo test -p orquestra --test e2e
//! ```

mod helpers;
mod scenarios;
