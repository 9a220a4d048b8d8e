use crate::runtime::rule::RuleBlueprint;

// Errors carry the provider's error code so handlers can surface it in their
// failure messages.
pub trait ListenerRuleStore {
    fn rule_priorities(&self, listener_arn: &str) -> Result<Vec<String>, String>;
    fn create_rule(&self, blueprint: &RuleBlueprint) -> Result<String, String>;
    fn delete_rule(&self, rule_arn: &str) -> Result<(), String>;
}
