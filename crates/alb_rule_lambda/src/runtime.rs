//! Single import boundary for the deterministic core primitives.

pub use alb_rule_core::{contract, priority, rule};
