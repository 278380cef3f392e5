//! E2E test scenarios.
//!
//! Each module covers one area of orchestrator behavior.

mod checkout;
mod container_order;
mod cycle;
mod phases;
mod teardown_failures;
