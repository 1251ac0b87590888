use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_INGREDIENTS: usize = 20;
pub const DEFAULT_MAX_INGREDIENT_CHARS: usize = 50;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("CLAUDE_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// What the processor does when the completion service or the model's reply lets it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Answer with a descriptive 500 so the caller can tell the causes apart.
    #[default]
    Surface,
    /// Answer 200 with the fixed fallback recipe.
    Fallback,
}

impl std::str::FromStr for FailurePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Self::Surface),
            "fallback" => Ok(Self::Fallback),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientLimits {
    pub max_items: usize,
    pub max_chars: usize,
}

impl Default for IngredientLimits {
    fn default() -> Self {
        Self { max_items: DEFAULT_MAX_INGREDIENTS, max_chars: DEFAULT_MAX_INGREDIENT_CHARS }
    }
}

/// Everything needed to talk to the Claude messages endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ClaudeConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub failure_policy: FailurePolicy,
    pub limits: IngredientLimits,
    /// `None` when no credential is configured; requests are then rejected as misconfigured.
    pub claude: Option<ClaudeConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let claude = match ClaudeConfig::new(var("CLAUDE_API_KEY").unwrap_or_default()) {
            Ok(cfg) => {
                let mut cfg = cfg;
                if let Some(model) = var("CLAUDE_MODEL") {
                    cfg = cfg.with_model(model);
                }
                if let Some(base) = var("CLAUDE_API_BASE") {
                    cfg = cfg.with_base_url(base);
                }
                let secs = parse_nonzero("CLAUDE_TIMEOUT_SECS", var("CLAUDE_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS)?;
                Some(cfg.with_timeout(Duration::from_secs(secs)))
            }
            Err(ConfigError::MissingApiKey) => None,
            Err(e) => return Err(e),
        };

        let failure_policy = match var("RECIPE_FAILURE_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name: "RECIPE_FAILURE_POLICY", value: raw })?,
            None => FailurePolicy::default(),
        };

        let limits = IngredientLimits {
            max_items: parse_nonzero("RECIPE_MAX_INGREDIENTS", var("RECIPE_MAX_INGREDIENTS"), DEFAULT_MAX_INGREDIENTS)?,
            max_chars: parse_nonzero(
                "RECIPE_MAX_INGREDIENT_CHARS",
                var("RECIPE_MAX_INGREDIENT_CHARS"),
                DEFAULT_MAX_INGREDIENT_CHARS,
            )?,
        };

        let port = parse_or("PORT", var("PORT"), DEFAULT_PORT)?;

        Ok(Self { port, failure_policy, limits, claude })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

// Zero would reject every request (limits) or fail every call (timeout).
fn parse_nonzero<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let value = parse_or(name, raw, default)?;
    if value == T::default() {
        return Err(ConfigError::InvalidValue { name, value: "0".into() });
    }
    Ok(value)
}
