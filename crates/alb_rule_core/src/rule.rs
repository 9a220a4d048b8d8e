use crate::contract::OidcSettings;

/// `claims` parameter forwarded to the authorization endpoint so the provider
/// returns a `userid` claim in both the id token and the userinfo response.
pub const OIDC_CLAIMS_REQUEST: &str =
    r#"{"id_token":{"userid":{"essential":true}},"userinfo":{"userid":{"essential":true}}}"#;

/// Action order within the rule. Authentication must run before the request
/// is forwarded to the target group.
pub const AUTHENTICATE_ACTION_ORDER: i32 = 1;
pub const FORWARD_ACTION_ORDER: i32 = 2;

/// Path pattern that scopes the rule to one notebook instance.
pub fn instance_path_pattern(instance_id: &str) -> String {
    format!("/{instance_id}/*")
}

/// OIDC coordinates a provisioned rule authenticates against, with the client
/// secret already resolved. Never log this value.
#[derive(Clone, PartialEq, Eq)]
pub struct OidcRuleConfig {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_info_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
}

impl OidcRuleConfig {
    pub fn new(settings: &OidcSettings, client_secret: impl Into<String>) -> Self {
        Self {
            issuer: settings.issuer.clone(),
            authorization_endpoint: settings.authorization_endpoint.clone(),
            token_endpoint: settings.token_endpoint.clone(),
            user_info_endpoint: settings.user_info_endpoint.clone(),
            client_id: settings.client_id.clone(),
            client_secret: client_secret.into(),
        }
    }
}

// Manual Debug keeps the client secret out of logs and panic messages.
impl std::fmt::Debug for OidcRuleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcRuleConfig")
            .field("issuer", &self.issuer)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("user_info_endpoint", &self.user_info_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Complete description of one listener rule to provision: authenticate via
/// OIDC, then forward to the target group, for paths under the instance id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBlueprint {
    pub listener_arn: String,
    pub priority: i32,
    pub path_pattern: String,
    pub target_group_arn: String,
    pub oidc: OidcRuleConfig,
}

impl RuleBlueprint {
    pub fn new(
        listener_arn: impl Into<String>,
        priority: i32,
        instance_id: &str,
        target_group_arn: impl Into<String>,
        oidc: OidcRuleConfig,
    ) -> Self {
        Self {
            listener_arn: listener_arn.into(),
            priority,
            path_pattern: instance_path_pattern(instance_id),
            target_group_arn: target_group_arn.into(),
            oidc,
        }
    }
}
