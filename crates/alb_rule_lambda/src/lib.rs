//! AWS-oriented adapters and handlers for listener-rule provisioning.
//!
//! This crate owns runtime integration details (the Lambda handler, AWS SDK
//! adapters, and custom-resource response delivery) and exposes a single
//! runtime module boundary for contract, priority, and rule primitives.

pub mod adapters;
pub mod cfn;
pub mod handlers;
pub mod runtime;
