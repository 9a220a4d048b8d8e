use alb_rule_core::contract::{CustomResourceEvent, CustomResourceResponse};
use alb_rule_core::rule::{
    RuleBlueprint, AUTHENTICATE_ACTION_ORDER, FORWARD_ACTION_ORDER, OIDC_CLAIMS_REQUEST,
};
use alb_rule_lambda::adapters::listener_rules::ListenerRuleStore;
use alb_rule_lambda::adapters::parameter_store::ParameterStore;
use alb_rule_lambda::cfn::ResponseSender;
use alb_rule_lambda::handlers::lifecycle::handle_event;
use aws_sdk_elasticloadbalancingv2::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_elasticloadbalancingv2::types::{
    Action, ActionTypeEnum, AuthenticateOidcActionConditionalBehaviorEnum,
    AuthenticateOidcActionConfig, PathPatternConditionConfig, RuleCondition,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

struct SsmParameterStore {
    ssm_client: aws_sdk_ssm::Client,
}

impl ParameterStore for SsmParameterStore {
    fn decrypted_parameter(&self, name: &str) -> Result<String, String> {
        let parameter_name = name.to_string();
        let client = self.ssm_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_parameter()
                    .name(parameter_name)
                    .with_decryption(true)
                    .send()
                    .await
                    .map_err(|error| provider_error_code(&error))?;
                output
                    .parameter()
                    .and_then(|parameter| parameter.value())
                    .map(str::to_string)
                    .ok_or_else(|| "parameter carried no value".to_string())
            })
        })
    }
}

struct Elbv2RuleStore {
    elbv2_client: aws_sdk_elasticloadbalancingv2::Client,
}

impl ListenerRuleStore for Elbv2RuleStore {
    fn rule_priorities(&self, listener_arn: &str) -> Result<Vec<String>, String> {
        let listener = listener_arn.to_string();
        let client = self.elbv2_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .describe_rules()
                    .listener_arn(listener)
                    .send()
                    .await
                    .map_err(|error| provider_error_code(&error))?;
                Ok(output
                    .rules()
                    .iter()
                    .filter_map(|rule| rule.priority().map(str::to_string))
                    .collect())
            })
        })
    }

    fn create_rule(&self, blueprint: &RuleBlueprint) -> Result<String, String> {
        let blueprint = blueprint.clone();
        let client = self.elbv2_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let authenticate_action = Action::builder()
                    .r#type(ActionTypeEnum::AuthenticateOidc)
                    .authenticate_oidc_config(
                        AuthenticateOidcActionConfig::builder()
                            .issuer(blueprint.oidc.issuer)
                            .authorization_endpoint(blueprint.oidc.authorization_endpoint)
                            .token_endpoint(blueprint.oidc.token_endpoint)
                            .user_info_endpoint(blueprint.oidc.user_info_endpoint)
                            .client_id(blueprint.oidc.client_id)
                            .client_secret(blueprint.oidc.client_secret)
                            .authentication_request_extra_params("claims", OIDC_CLAIMS_REQUEST)
                            .on_unauthenticated_request(
                                AuthenticateOidcActionConditionalBehaviorEnum::Authenticate,
                            )
                            .build(),
                    )
                    .order(AUTHENTICATE_ACTION_ORDER)
                    .build();

                let forward_action = Action::builder()
                    .r#type(ActionTypeEnum::Forward)
                    .target_group_arn(blueprint.target_group_arn)
                    .order(FORWARD_ACTION_ORDER)
                    .build();

                let path_condition = RuleCondition::builder()
                    .field("path-pattern")
                    .path_pattern_config(
                        PathPatternConditionConfig::builder()
                            .values(blueprint.path_pattern)
                            .build(),
                    )
                    .build();

                let output = client
                    .create_rule()
                    .listener_arn(blueprint.listener_arn)
                    .priority(blueprint.priority)
                    .conditions(path_condition)
                    .actions(authenticate_action)
                    .actions(forward_action)
                    .send()
                    .await
                    .map_err(|error| provider_error_code(&error))?;

                output
                    .rules()
                    .first()
                    .and_then(|rule| rule.rule_arn())
                    .map(str::to_string)
                    .ok_or_else(|| "create-rule response carried no rule arn".to_string())
            })
        })
    }

    fn delete_rule(&self, rule_arn: &str) -> Result<(), String> {
        let rule = rule_arn.to_string();
        let client = self.elbv2_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .delete_rule()
                    .rule_arn(rule)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| provider_error_code(&error))
            })
        })
    }
}

// Handlers wrap adapter failures into operator-facing messages, so adapters
// report the bare provider error code when one exists.
fn provider_error_code<E>(error: &SdkError<E>) -> String
where
    E: ProvideErrorMetadata,
{
    error
        .code()
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

async fn handle_request(request: LambdaEvent<Value>) -> Result<Value, Error> {
    let event: CustomResourceEvent = serde_json::from_value(request.payload)
        .map_err(|error| Error::from(format!("invalid custom-resource event: {error}")))?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let parameters = SsmParameterStore {
        ssm_client: aws_sdk_ssm::Client::new(&aws_config),
    };
    let rules = Elbv2RuleStore {
        elbv2_client: aws_sdk_elasticloadbalancingv2::Client::new(&aws_config),
    };

    let outcome = handle_event(
        &event,
        &|name| std::env::var(name).ok(),
        &parameters,
        &rules,
    );

    let response = match &outcome {
        Ok(outcome) => {
            CustomResourceResponse::success(&event, outcome.physical_resource_id.clone())
        }
        Err(error) => CustomResourceResponse::failed(&event, error.message.clone()),
    };
    ResponseSender::new()
        .send(&event.response_url, &response)
        .await
        .map_err(Error::from)?;

    Ok(match outcome {
        Ok(outcome) => json!({
            "status": "ok",
            "physical_resource_id": outcome.physical_resource_id,
        }),
        Err(error) => json!({
            "status": "failed",
            "reason": error.message,
        }),
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::run(service_fn(handle_request)).await
}
