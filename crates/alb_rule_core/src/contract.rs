use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MISSING_PROPERTY_ERROR: &str = "Parameter is required";
pub const MISSING_ENVIRONMENT_VARIABLE_ERROR: &str = "Environment variable is required";

/// Resource properties every request must carry, in extraction order.
pub const RULE_PROPERTY_NAMES: [&str; 3] = ["InstanceId", "TargetGroupArn", "ListenerArn"];

/// Process environment variables the provisioning flow must resolve, in
/// extraction order.
pub const OIDC_VARIABLE_NAMES: [&str; 6] = [
    "OIDC_CLIENT_SECRET_KEYNAME",
    "OIDC_ISSUER",
    "OIDC_AUTHORIZATION_ENDPOINT",
    "OIDC_TOKEN_ENDPOINT",
    "OIDC_USER_INFO_ENDPOINT",
    "OIDC_CLIENT_ID",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Create,
    Update,
    Delete,
}

/// Custom-resource request as CloudFormation delivers it to the function.
///
/// Unknown fields (`ServiceToken`, `ResourceType`, ...) are ignored on
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomResourceEvent {
    #[serde(rename = "RequestType")]
    pub request_type: RequestKind,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(rename = "StackId")]
    pub stack_id: String,
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: String,
    #[serde(rename = "PhysicalResourceId", skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(rename = "ResourceProperties", default)]
    pub resource_properties: BTreeMap<String, Value>,
}

impl CustomResourceEvent {
    /// String value of a resource property, if present.
    pub fn property(&self, name: &str) -> Option<String> {
        self.resource_properties
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Physical id to echo back when no new rule was provisioned.
    ///
    /// Delete and failure responses must repeat the id CloudFormation already
    /// knows; first-create failures have none yet, so the logical id stands in.
    pub fn echoed_physical_id(&self) -> String {
        self.physical_resource_id
            .clone()
            .unwrap_or_else(|| self.logical_resource_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Resolve `names` through `lookup`, in order, failing on the first name that
/// is absent or empty.
///
/// The error message is `"{error_prefix}: {name}"` so callers can tell a
/// missing resource property apart from a missing environment variable.
pub fn required_values<F>(
    lookup: F,
    names: &[&str],
    error_prefix: &str,
) -> Result<Vec<String>, ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut values = Vec::with_capacity(names.len());
    for name in names {
        match lookup(name) {
            Some(value) if !value.is_empty() => values.push(value),
            _ => return Err(ValidationError::new(format!("{error_prefix}: {name}"))),
        }
    }
    Ok(values)
}

/// Rule inputs supplied through the custom resource's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleProperties {
    pub instance_id: String,
    pub target_group_arn: String,
    pub listener_arn: String,
}

impl RuleProperties {
    pub fn from_event(event: &CustomResourceEvent) -> Result<Self, ValidationError> {
        let values = required_values(
            |name| event.property(name),
            &RULE_PROPERTY_NAMES,
            MISSING_PROPERTY_ERROR,
        )?;
        let [instance_id, target_group_arn, listener_arn]: [String; 3] = values
            .try_into()
            .map_err(|_| ValidationError::new("expected exactly three resource properties"))?;
        Ok(Self {
            instance_id,
            target_group_arn,
            listener_arn,
        })
    }
}

/// OIDC provider coordinates supplied through the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcSettings {
    pub client_secret_keyname: String,
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_info_endpoint: String,
    pub client_id: String,
}

impl OidcSettings {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = required_values(
            lookup,
            &OIDC_VARIABLE_NAMES,
            MISSING_ENVIRONMENT_VARIABLE_ERROR,
        )?;
        let [client_secret_keyname, issuer, authorization_endpoint, token_endpoint, user_info_endpoint, client_id]: [String; 6] = values
            .try_into()
            .map_err(|_| ValidationError::new("expected exactly six OIDC settings"))?;
        Ok(Self {
            client_secret_keyname,
            issuer,
            authorization_endpoint,
            token_endpoint,
            user_info_endpoint,
            client_id,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Body delivered to the event's presigned response URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomResourceResponse {
    #[serde(rename = "Status")]
    pub status: ResponseStatus,
    #[serde(rename = "Reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "PhysicalResourceId")]
    pub physical_resource_id: String,
    #[serde(rename = "StackId")]
    pub stack_id: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: String,
}

impl CustomResourceResponse {
    pub fn success(event: &CustomResourceEvent, physical_resource_id: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: None,
            physical_resource_id: physical_resource_id.into(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
        }
    }

    pub fn failed(event: &CustomResourceEvent, reason: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            reason: Some(reason.into()),
            physical_resource_id: event.echoed_physical_id(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    fn create_event() -> CustomResourceEvent {
        serde_json::from_value(json!({
            "RequestType": "Create",
            "ServiceToken": "arn:aws:lambda:eu-west-1:111122223333:function:rule-provisioner",
            "ResponseURL": "https://cloudformation-custom-resource-response.s3.amazonaws.com/cb",
            "StackId": "arn:aws:cloudformation:eu-west-1:111122223333:stack/notebook/guid",
            "RequestId": "7ef9dcba-0001-4a3f-b0f9-2e4a0c7d2a11",
            "LogicalResourceId": "NotebookListenerRule",
            "ResourceType": "Custom::ListenerRule",
            "ResourceProperties": {
                "ServiceToken": "arn:aws:lambda:eu-west-1:111122223333:function:rule-provisioner",
                "InstanceId": "i-049f8b7f35ef87673",
                "TargetGroupArn": "arn:aws:elasticloadbalancing:eu-west-1:111122223333:targetgroup/notebook/aa11",
                "ListenerArn": "arn:aws:elasticloadbalancing:eu-west-1:111122223333:listener/app/notebook/bb22/cc33"
            }
        }))
        .expect("create event fixture should deserialize")
    }

    #[test]
    fn parses_create_event_and_ignores_unknown_fields() {
        let event = create_event();

        assert_eq!(event.request_type, RequestKind::Create);
        assert_eq!(event.request_id, "7ef9dcba-0001-4a3f-b0f9-2e4a0c7d2a11");
        assert_eq!(event.logical_resource_id, "NotebookListenerRule");
        assert_eq!(event.physical_resource_id, None);
        assert_eq!(
            event.property("InstanceId"),
            Some("i-049f8b7f35ef87673".to_string())
        );
    }

    #[test]
    fn parses_delete_event_with_physical_resource_id() {
        let event: CustomResourceEvent = serde_json::from_value(json!({
            "RequestType": "Delete",
            "ResponseURL": "https://cloudformation-custom-resource-response.s3.amazonaws.com/cb",
            "StackId": "arn:aws:cloudformation:eu-west-1:111122223333:stack/notebook/guid",
            "RequestId": "7ef9dcba-0002-4a3f-b0f9-2e4a0c7d2a11",
            "LogicalResourceId": "NotebookListenerRule",
            "PhysicalResourceId": "arn:aws:elasticloadbalancing:eu-west-1:111122223333:listener-rule/app/notebook/bb22/cc33/dd44",
            "ResourceProperties": {}
        }))
        .expect("delete event fixture should deserialize");

        assert_eq!(event.request_type, RequestKind::Delete);
        assert_eq!(
            event.physical_resource_id.as_deref(),
            Some("arn:aws:elasticloadbalancing:eu-west-1:111122223333:listener-rule/app/notebook/bb22/cc33/dd44")
        );
    }

    #[test]
    fn extracts_required_values_in_declaration_order() {
        let lookup = lookup_from(&[("B", "two"), ("A", "one"), ("C", "three")]);

        let values = required_values(lookup, &["A", "B", "C"], MISSING_PROPERTY_ERROR)
            .expect("all names are present");

        assert_eq!(values, vec!["one", "two", "three"]);
    }

    #[test]
    fn missing_value_error_names_first_absent_key() {
        let lookup = lookup_from(&[("A", "one"), ("C", "three")]);

        let error = required_values(lookup, &["A", "B", "C"], MISSING_PROPERTY_ERROR)
            .expect_err("B is absent");

        assert_eq!(error.message(), "Parameter is required: B");
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let lookup = lookup_from(&[("A", "")]);

        let error = required_values(lookup, &["A"], MISSING_ENVIRONMENT_VARIABLE_ERROR)
            .expect_err("empty values are rejected");

        assert_eq!(error.message(), "Environment variable is required: A");
    }

    #[test]
    fn rule_properties_extract_ordered_triple() {
        let properties =
            RuleProperties::from_event(&create_event()).expect("fixture carries all properties");

        assert_eq!(properties.instance_id, "i-049f8b7f35ef87673");
        assert_eq!(
            properties.target_group_arn,
            "arn:aws:elasticloadbalancing:eu-west-1:111122223333:targetgroup/notebook/aa11"
        );
        assert_eq!(
            properties.listener_arn,
            "arn:aws:elasticloadbalancing:eu-west-1:111122223333:listener/app/notebook/bb22/cc33"
        );
    }

    #[test]
    fn rule_properties_reject_event_without_instance_id() {
        let mut event = create_event();
        event.resource_properties.remove("InstanceId");

        let error = RuleProperties::from_event(&event).expect_err("InstanceId is required");

        assert_eq!(error.message(), "Parameter is required: InstanceId");
    }

    #[test]
    fn oidc_settings_resolve_all_six_variables() {
        let lookup = lookup_from(&[
            ("OIDC_CLIENT_SECRET_KEYNAME", "/notebook/oidc/client-secret"),
            ("OIDC_ISSUER", "https://login.example.org"),
            ("OIDC_AUTHORIZATION_ENDPOINT", "https://login.example.org/authorize"),
            ("OIDC_TOKEN_ENDPOINT", "https://login.example.org/token"),
            ("OIDC_USER_INFO_ENDPOINT", "https://login.example.org/userinfo"),
            ("OIDC_CLIENT_ID", "notebook-client"),
        ]);

        let settings = OidcSettings::from_lookup(lookup).expect("all variables are set");

        assert_eq!(settings.client_secret_keyname, "/notebook/oidc/client-secret");
        assert_eq!(settings.issuer, "https://login.example.org");
        assert_eq!(
            settings.authorization_endpoint,
            "https://login.example.org/authorize"
        );
        assert_eq!(settings.token_endpoint, "https://login.example.org/token");
        assert_eq!(
            settings.user_info_endpoint,
            "https://login.example.org/userinfo"
        );
        assert_eq!(settings.client_id, "notebook-client");
    }

    #[test]
    fn oidc_settings_name_first_missing_variable() {
        let error = OidcSettings::from_lookup(|_| None::<String>)
            .expect_err("no variables are set");

        assert_eq!(
            error.message(),
            "Environment variable is required: OIDC_CLIENT_SECRET_KEYNAME"
        );
    }

    #[test]
    fn success_response_omits_reason() {
        let event = create_event();

        let response = CustomResourceResponse::success(&event, "rule-arn");
        let body = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(body["Status"], "SUCCESS");
        assert_eq!(body["PhysicalResourceId"], "rule-arn");
        assert_eq!(body["StackId"], event.stack_id);
        assert_eq!(body["RequestId"], event.request_id);
        assert_eq!(body["LogicalResourceId"], event.logical_resource_id);
        assert!(body.get("Reason").is_none());
    }

    #[test]
    fn failed_response_without_physical_id_echoes_logical_id() {
        let event = create_event();

        let response = CustomResourceResponse::failed(&event, "Parameter is required: InstanceId");
        let body = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(body["Status"], "FAILED");
        assert_eq!(body["Reason"], "Parameter is required: InstanceId");
        assert_eq!(body["PhysicalResourceId"], "NotebookListenerRule");
    }

    #[test]
    fn failed_response_prefers_event_physical_id() {
        let mut event = create_event();
        event.physical_resource_id = Some("existing-rule-arn".to_string());

        let response = CustomResourceResponse::failed(&event, "Problem creating rule");

        assert_eq!(response.physical_resource_id, "existing-rule-arn");
    }
}
