//! Shared E2E test helpers.
//!
//! Provides reusable utilities for building test configurations,
//! recording lifecycle calls from mock components and containers, and
//! asserting on the recorded order.

pub mod assertions;
pub mod config;
pub mod mock_component;
pub mod mock_container;
pub mod tracker;
