pub mod listener_rules;
pub mod parameter_store;
