//! Interpreter - Execute Effects using a Provider
//!
//! The Interpreter executes Effects contained in a Plan in order. References
//! are resolved against the binding map immediately before each effect runs,
//! and the results of each create flow back into the map so later effects see
//! real identifiers. This is where side effects actually occur.

use crate::bindings::BindingMap;
use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{Provider, ProviderError, ProviderResult};
use crate::resource::{ResourceId, State};

/// Result of executing each Effect
#[derive(Debug)]
pub enum EffectOutcome {
    /// Read succeeded
    Read { state: State },
    /// Create succeeded
    Created { state: State },
    /// Update succeeded
    Updated { state: State },
    /// Delete succeeded
    Deleted,
    /// Skipped (e.g., dry-run)
    Skipped { reason: String },
}

/// One executed Effect with its outcome
#[derive(Debug)]
pub struct ExecutedEffect {
    pub id: ResourceId,
    pub binding: Option<String>,
    pub outcome: Result<EffectOutcome, ProviderError>,
}

/// Result of executing the entire Plan
#[derive(Debug)]
pub struct ApplyResult {
    pub effects: Vec<ExecutedEffect>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// Interpreter configuration
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// If true, skip actual side effects
    pub dry_run: bool,
    /// Continue on error
    pub continue_on_error: bool,
}

/// Interpreter that executes Effects using a Provider
pub struct Interpreter<P: Provider> {
    provider: P,
    config: InterpreterConfig,
}

impl<P: Provider> Interpreter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute a Plan, interpreting all Effects and causing side effects
    pub async fn apply(&self, plan: &Plan, bindings: &mut BindingMap) -> ApplyResult {
        let mut effects = Vec::new();
        let mut success_count = 0;
        let mut failure_count = 0;

        for effect in plan.effects() {
            let executed = self.execute_effect(effect, bindings).await;

            let failed = executed.outcome.is_err();
            if failed {
                failure_count += 1;
            } else {
                success_count += 1;
            }
            effects.push(executed);

            if failed && !self.config.continue_on_error {
                break;
            }
        }

        ApplyResult {
            effects,
            success_count,
            failure_count,
        }
    }

    /// Execute a single Effect, resolving references first and recording
    /// created state back into the binding map
    pub async fn execute_effect(
        &self,
        effect: &Effect,
        bindings: &mut BindingMap,
    ) -> ExecutedEffect {
        let id = effect.resource_id().clone();
        let binding = match effect {
            Effect::Create(resource) => resource.binding().map(str::to_string),
            Effect::Update { to, .. } => to.binding().map(str::to_string),
            _ => None,
        };

        let outcome = self.run(effect, bindings, binding.as_deref()).await;

        ExecutedEffect {
            id,
            binding,
            outcome,
        }
    }

    async fn run(
        &self,
        effect: &Effect,
        bindings: &mut BindingMap,
        binding: Option<&str>,
    ) -> ProviderResult<EffectOutcome> {
        if self.config.dry_run {
            return Ok(EffectOutcome::Skipped {
                reason: "dry-run mode".to_string(),
            });
        }

        match effect {
            Effect::Read(id) => {
                let state = self.provider.read(id, None).await?;
                Ok(EffectOutcome::Read { state })
            }
            Effect::Create(resource) => {
                let resolved = bindings
                    .resolve_resource(resource)
                    .map_err(|e| ProviderError::new(e.to_string()).for_resource(resource.id.clone()))?;

                let state = self.provider.create(&resolved).await?;

                if let Some(binding) = binding {
                    // Resolved attributes first, observed state wins
                    bindings.record_state(
                        binding,
                        &State::existing(resolved.id.clone(), resolved.attributes.clone()),
                    );
                    bindings.record_state(binding, &state);
                }
                Ok(EffectOutcome::Created { state })
            }
            Effect::Update { id, from, to } => {
                let resolved = bindings
                    .resolve_resource(to)
                    .map_err(|e| ProviderError::new(e.to_string()).for_resource(id.clone()))?;

                let identifier = from.identifier.as_deref().unwrap_or("");
                let state = self.provider.update(id, identifier, from, &resolved).await?;

                if let Some(binding) = binding {
                    bindings.record_state(binding, &state);
                }
                Ok(EffectOutcome::Updated { state })
            }
            Effect::Delete(id) => {
                // Delete without identifier only works for providers that can
                // look resources up by name; the CLI passes identifiers from
                // the deployment record when destroying
                self.provider.delete(id, "").await?;
                Ok(EffectOutcome::Deleted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::MockProvider;
    use crate::resource::{Resource, Value};

    #[tokio::test]
    async fn apply_empty_plan() {
        let interpreter = Interpreter::new(MockProvider);
        let plan = Plan::new();
        let mut bindings = BindingMap::new();
        let result = interpreter.apply(&plan, &mut bindings).await;

        assert!(result.is_success());
        assert_eq!(result.success_count, 0);
    }

    #[tokio::test]
    async fn apply_create_records_binding() {
        let interpreter = Interpreter::new(MockProvider);
        let mut plan = Plan::new();
        plan.add(Effect::Create(
            Resource::new("vpc", "demo-vpc")
                .with_binding("vpc")
                .with_attribute("cidr_block", Value::string("10.0.0.0/16")),
        ));

        let mut bindings = BindingMap::new();
        let result = interpreter.apply(&plan, &mut bindings).await;

        assert!(result.is_success());
        assert_eq!(result.success_count, 1);
        assert_eq!(
            bindings.get("vpc", "identifier"),
            Some(&Value::string("mock-id-123"))
        );
    }

    #[tokio::test]
    async fn create_resolves_references_in_order() {
        let interpreter = Interpreter::new(MockProvider);
        let mut plan = Plan::new();
        plan.add(Effect::Create(
            Resource::new("vpc", "demo-vpc")
                .with_binding("vpc")
                .with_attribute("cidr_block", Value::string("10.0.0.0/16")),
        ));
        plan.add(Effect::Create(
            Resource::new("subnet", "demo-public-0")
                .with_binding("public_subnet_0")
                .with_attribute("vpc_id", Value::reference("vpc", "identifier")),
        ));

        let mut bindings = BindingMap::new();
        let result = interpreter.apply(&plan, &mut bindings).await;

        assert!(result.is_success());
        assert_eq!(
            bindings.get("public_subnet_0", "vpc_id"),
            Some(&Value::string("mock-id-123"))
        );
    }

    #[tokio::test]
    async fn unresolved_reference_fails_the_effect() {
        let interpreter = Interpreter::new(MockProvider);
        let mut plan = Plan::new();
        plan.add(Effect::Create(
            Resource::new("subnet", "demo-public-0")
                .with_attribute("vpc_id", Value::reference("vpc", "vpc_id")),
        ));

        let mut bindings = BindingMap::new();
        let result = interpreter.apply(&plan, &mut bindings).await;

        assert!(!result.is_success());
        assert_eq!(result.failure_count, 1);
    }

    #[tokio::test]
    async fn dry_run_skips_effects() {
        let config = InterpreterConfig {
            dry_run: true,
            ..Default::default()
        };
        let interpreter = Interpreter::new(MockProvider).with_config(config);
        let mut plan = Plan::new();
        plan.add(Effect::Create(Resource::new("vpc", "demo-vpc")));

        let mut bindings = BindingMap::new();
        let result = interpreter.apply(&plan, &mut bindings).await;

        assert!(result.is_success());
        assert!(matches!(
            result.effects[0].outcome,
            Ok(EffectOutcome::Skipped { .. })
        ));
    }
}
