use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::claude::ClaudeClient;
use crate::config::{Config, FailurePolicy, IngredientLimits};
use crate::error::RecipeError;
use crate::models::{IngredientList, IngredientsInput, RecipeResult};
use crate::prompt::build_prompt;
use crate::recipe::{enforce_limits, fallback_recipe, normalize_ingredients, parse_recipe, sanitize_candidate};

/// A text-completion backend: prompt in, generated text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RecipeError>;
}

pub struct RecipeProcessor {
    completion: Option<Arc<dyn CompletionService>>,
    policy: FailurePolicy,
    limits: IngredientLimits,
}

impl RecipeProcessor {
    pub fn new(completion: Option<Arc<dyn CompletionService>>, policy: FailurePolicy, limits: IngredientLimits) -> Self {
        Self { completion, policy, limits }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let completion = match &config.claude {
            Some(claude) => {
                let client = ClaudeClient::new(claude)?;
                info!("Using Claude model {}", client.model());
                Some(Arc::new(client) as Arc<dyn CompletionService>)
            }
            None => {
                warn!("CLAUDE_API_KEY is not set; recipe requests will be rejected");
                None
            }
        };
        Ok(Self::new(completion, config.failure_policy, config.limits))
    }

    /// Runs one request from raw input to a finished recipe, applying the failure policy.
    pub async fn process(&self, raw: IngredientsInput) -> Result<RecipeResult, RecipeError> {
        let ingredients = normalize_ingredients(raw)?;
        enforce_limits(&ingredients, &self.limits)?;
        let completion = self.completion.as_ref().ok_or(RecipeError::Misconfigured)?;

        info!("🍳 Generating recipe for {} ingredient(s): {}", ingredients.len(), ingredients.joined("、"));

        match self.generate(completion.as_ref(), &ingredients).await {
            Ok(recipe) => {
                info!("✅ Recipe ready: {}", recipe.dish_name.as_deref().unwrap_or("(untitled)"));
                Ok(recipe)
            }
            Err(e) if self.policy == FailurePolicy::Fallback && e.is_substitutable() => {
                warn!("🔄 {} ({}); serving fallback recipe", e, e.kind());
                Ok(fallback_recipe(&ingredients))
            }
            Err(e) => {
                warn!("❌ Recipe generation failed ({}): {}", e.kind(), e);
                Err(e)
            }
        }
    }

    async fn generate(
        &self,
        completion: &dyn CompletionService,
        ingredients: &IngredientList,
    ) -> Result<RecipeResult, RecipeError> {
        let prompt = build_prompt(ingredients);
        debug!("prompt built ({} chars)", prompt.chars().count());

        let text = completion.complete(&prompt).await?;
        debug!("completion text received ({} chars)", text.chars().count());

        let sanitized = sanitize_candidate(&text);
        parse_recipe(&sanitized, ingredients)
    }
}
