//! How to register a gateway
//!
//! 1) Implement `DecisionGateway` for your type in its module.
//! 2) Add a new `GatewayFactory` entry to the static list with stable `name` and `version`.
//! 3) Keep ordering stable; avoid side effects in constructors.
//! 4) Determinism: same seed ⇒ same behavior (where applicable).

use std::sync::Arc;

use crate::ai::{AiConfig, AiError, ChatCompletionsGateway, DecisionGateway, HeuristicGateway};
use crate::error::AppError;

/// Factory definition for constructing gateways.
pub struct GatewayFactory {
    pub name: &'static str,
    pub version: &'static str,
    pub make: fn(config: &AiConfig) -> Result<Arc<dyn DecisionGateway>, AiError>,
}

static GATEWAY_FACTORIES: &[GatewayFactory] = &[
    GatewayFactory {
        name: HeuristicGateway::NAME,
        version: HeuristicGateway::VERSION,
        make: make_heuristic,
    },
    GatewayFactory {
        name: ChatCompletionsGateway::NAME,
        version: ChatCompletionsGateway::VERSION,
        make: make_chat_completions,
    },
];

/// Returns the statically registered gateway factories.
pub fn registered_gateways() -> &'static [GatewayFactory] {
    GATEWAY_FACTORIES
}

/// Finds a registered gateway factory by its name.
pub fn by_name(name: &str) -> Option<&'static GatewayFactory> {
    registered_gateways()
        .iter()
        .find(|factory| factory.name == name)
}

/// Build the gateway named by `config`.
pub fn build_gateway(config: &AiConfig) -> Result<Arc<dyn DecisionGateway>, AppError> {
    let name = config.gateway_name();
    let factory =
        by_name(name).ok_or_else(|| AppError::config(format!("unknown AI gateway '{name}'")))?;
    (factory.make)(config).map_err(|e| AppError::config(format!("AI gateway '{name}': {e}")))
}

fn make_heuristic(config: &AiConfig) -> Result<Arc<dyn DecisionGateway>, AiError> {
    Ok(Arc::new(HeuristicGateway::new(config.seed())))
}

fn make_chat_completions(config: &AiConfig) -> Result<Arc<dyn DecisionGateway>, AiError> {
    Ok(Arc::new(ChatCompletionsGateway::new(config)?))
}
