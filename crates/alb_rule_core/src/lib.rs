//! Deterministic core logic for load balancer listener-rule provisioning.
//!
//! This crate owns the custom-resource request/response contract, required
//! value extraction, rule priority computation, and the shape of the rule to
//! provision. It intentionally excludes AWS SDK and Lambda runtime concerns
//! so behavior stays easy to test.

pub mod contract;
pub mod priority;
pub mod rule;
