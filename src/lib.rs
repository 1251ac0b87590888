pub mod claude;
pub mod config;
pub mod error;
pub mod models;
pub mod processor;
pub mod prompt;
pub mod recipe;
pub mod routes;

pub use config::{ClaudeConfig, Config, FailurePolicy, IngredientLimits};
pub use error::RecipeError;
pub use models::{IngredientList, IngredientsInput, RecipeRequest, RecipeResult};
pub use processor::{CompletionService, RecipeProcessor};
pub use routes::{router, AppState};
