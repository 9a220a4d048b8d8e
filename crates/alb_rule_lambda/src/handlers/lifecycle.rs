use serde_json::json;

use crate::adapters::listener_rules::ListenerRuleStore;
use crate::adapters::parameter_store::ParameterStore;
use crate::runtime::contract::{
    CustomResourceEvent, OidcSettings, RequestKind, RuleProperties, ValidationError,
};
use crate::runtime::priority::next_priority;
use crate::runtime::rule::{OidcRuleConfig, RuleBlueprint};

pub const SECRET_ACCESS_ERROR: &str =
    "OIDC client secret key not found in AWS Systems Manager parameter store";
pub const RULES_ACCESS_ERROR: &str = "Problem retrieving AWS application load balancer rules";
pub const RULE_CREATION_ERROR: &str = "Problem creating AWS application load balancer rule";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOutcome {
    pub physical_resource_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleError {
    pub message: String,
}

impl From<ValidationError> for LifecycleError {
    fn from(error: ValidationError) -> Self {
        Self {
            message: error.message().to_string(),
        }
    }
}

/// Drive one custom-resource request to completion.
///
/// Create provisions a fresh rule. Update replaces the rule recorded in the
/// event's physical id with a freshly provisioned one. Delete removes that
/// rule. Removal is best effort: a rule that is already gone must not wedge
/// a stack update or teardown.
pub fn handle_event(
    event: &CustomResourceEvent,
    env_lookup: &dyn Fn(&str) -> Option<String>,
    parameters: &impl ParameterStore,
    rules: &impl ListenerRuleStore,
) -> Result<LifecycleOutcome, LifecycleError> {
    log_lifecycle_info(
        "request_received",
        json!({
            "request_type": event.request_type,
            "request_id": event.request_id.clone(),
            "logical_resource_id": event.logical_resource_id.clone(),
        }),
    );

    let outcome = match event.request_type {
        RequestKind::Create => provision_rule(event, env_lookup, parameters, rules),
        RequestKind::Update => {
            remove_existing_rule(event, rules);
            provision_rule(event, env_lookup, parameters, rules)
        }
        RequestKind::Delete => {
            remove_existing_rule(event, rules);
            Ok(LifecycleOutcome {
                physical_resource_id: event.echoed_physical_id(),
            })
        }
    };

    if let Err(error) = &outcome {
        log_lifecycle_error(
            "request_failed",
            json!({
                "request_id": event.request_id.clone(),
                "error": error.message.clone(),
            }),
        );
    }

    outcome
}

fn provision_rule(
    event: &CustomResourceEvent,
    env_lookup: &dyn Fn(&str) -> Option<String>,
    parameters: &impl ParameterStore,
    rules: &impl ListenerRuleStore,
) -> Result<LifecycleOutcome, LifecycleError> {
    let properties = RuleProperties::from_event(event)?;
    let settings = OidcSettings::from_lookup(env_lookup)?;

    let client_secret = parameters
        .decrypted_parameter(&settings.client_secret_keyname)
        .map_err(|code| LifecycleError {
            message: format!(
                "{SECRET_ACCESS_ERROR}: key_name={}; {code}",
                settings.client_secret_keyname
            ),
        })?;

    let raw_priorities =
        rules
            .rule_priorities(&properties.listener_arn)
            .map_err(|code| LifecycleError {
                message: format!(
                    "{RULES_ACCESS_ERROR}: listener_arn={}; {code}",
                    properties.listener_arn
                ),
            })?;
    let priority = next_priority(&raw_priorities).map_err(|error| LifecycleError {
        message: format!(
            "{RULES_ACCESS_ERROR}: listener_arn={}; {error}",
            properties.listener_arn
        ),
    })?;
    log_lifecycle_info(
        "priority_computed",
        json!({
            "listener_arn": properties.listener_arn.clone(),
            "existing_rules": raw_priorities.len(),
            "priority": priority,
        }),
    );

    let blueprint = RuleBlueprint::new(
        properties.listener_arn.clone(),
        priority,
        &properties.instance_id,
        properties.target_group_arn.clone(),
        OidcRuleConfig::new(&settings, client_secret),
    );
    let rule_arn = rules.create_rule(&blueprint).map_err(|code| LifecycleError {
        message: format!("{RULE_CREATION_ERROR}; {code}"),
    })?;
    log_lifecycle_info(
        "rule_created",
        json!({
            "rule_arn": rule_arn.clone(),
            "listener_arn": blueprint.listener_arn.clone(),
            "path_pattern": blueprint.path_pattern.clone(),
            "priority": blueprint.priority,
        }),
    );

    Ok(LifecycleOutcome {
        physical_resource_id: rule_arn,
    })
}

fn remove_existing_rule(event: &CustomResourceEvent, rules: &impl ListenerRuleStore) {
    let Some(rule_arn) = event.physical_resource_id.as_deref() else {
        log_lifecycle_info(
            "rule_removal_skipped",
            json!({
                "logical_resource_id": event.logical_resource_id.clone(),
                "reason": "event carries no physical resource id",
            }),
        );
        return;
    };

    match rules.delete_rule(rule_arn) {
        Ok(()) => log_lifecycle_info("rule_deleted", json!({ "rule_arn": rule_arn })),
        Err(code) => log_lifecycle_error(
            "rule_removal_failed",
            json!({
                "rule_arn": rule_arn,
                "error": code,
            }),
        ),
    }
}

fn log_lifecycle_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "rule_lifecycle",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_lifecycle_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "rule_lifecycle",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
