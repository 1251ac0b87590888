//! Pure recipe helpers: input normalization, reply sanitizing and parsing, and the fallback recipe.

use serde_json::{Map, Value};

use crate::config::IngredientLimits;
use crate::error::RecipeError;
use crate::models::{IngredientList, IngredientsInput, RecipeResult};
use crate::prompt::RECIPE_FIELDS;

/// Separators accepted in a free-text ingredient string: ASCII comma, ideographic comma, newline.
pub const INGREDIENT_DELIMITERS: [char; 3] = [',', '、', '\n'];

/// The fence token models like to wrap JSON in. `` ```json `` is removed before bare `` ``` ``.
const FENCE_TOKENS: [&str; 2] = ["```json", "```"];

/// How many of the caller's ingredients stand in when the model omits its own list.
pub const FALLBACK_INGREDIENT_COUNT: usize = 5;

/// Generic steps substituted when a parsed reply lacks usable ones.
const REPAIR_STEPS: [&str; 3] = ["材料を切る", "加熱する", "味を整える"];

/// Steps of the fixed fallback recipe.
const FALLBACK_RECIPE_STEPS: [&str; 3] = ["材料を切る", "フライパンで炒める", "お好みの調味料で味付け"];

pub fn fallback_steps() -> Vec<String> {
    REPAIR_STEPS.iter().map(|s| s.to_string()).collect()
}

pub fn normalize_ingredients(raw: IngredientsInput) -> Result<IngredientList, RecipeError> {
    let pieces: Vec<String> = match raw {
        IngredientsInput::Delimited(text) => text
            .split(&INGREDIENT_DELIMITERS[..])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        IngredientsInput::List(items) => items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        IngredientsInput::Unsupported => Vec::new(),
    };

    if pieces.is_empty() {
        return Err(RecipeError::EmptyIngredients);
    }
    Ok(IngredientList::new_unchecked(pieces))
}

pub fn enforce_limits(ingredients: &IngredientList, limits: &IngredientLimits) -> Result<(), RecipeError> {
    if ingredients.len() > limits.max_items {
        return Err(RecipeError::InvalidInput(format!(
            "too many ingredients: {} given, at most {} allowed",
            ingredients.len(),
            limits.max_items
        )));
    }
    if let Some(long) = ingredients.as_slice().iter().find(|s| s.chars().count() > limits.max_chars) {
        return Err(RecipeError::InvalidInput(format!(
            "ingredient is too long (at most {} characters): {}",
            limits.max_chars,
            long.chars().take(limits.max_chars).collect::<String>()
        )));
    }
    Ok(())
}

pub fn sanitize_candidate(text: &str) -> String {
    let mut cleaned = text.to_string();
    for token in FENCE_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    cleaned.trim().to_string()
}

pub fn parse_recipe(sanitized: &str, original: &IngredientList) -> Result<RecipeResult, RecipeError> {
    let parse_error = |message: String| RecipeError::StructuredParse { message, raw_text: sanitized.to_string() };

    let value: Value = serde_json::from_str(sanitized).map_err(|e| parse_error(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(parse_error("expected a JSON object".to_string()));
    };

    let [dish_name_key, encouragement_key, time_key, difficulty_key, ingredients_key, steps_key, tip_key] = RECIPE_FIELDS;

    let ingredients = string_list(&fields, ingredients_key).unwrap_or_else(|| {
        tracing::debug!("reply had no usable ingredients, using the caller's");
        original.leading(FALLBACK_INGREDIENT_COUNT)
    });
    let steps = string_list(&fields, steps_key).unwrap_or_else(|| {
        tracing::debug!("reply had no usable steps, using generic ones");
        fallback_steps()
    });

    let difficulty = text_field(&fields, difficulty_key);
    if let Some(d) = difficulty.as_deref() {
        if !crate::models::KNOWN_DIFFICULTIES.contains(&d) {
            tracing::debug!("unrecognized difficulty label passed through: {}", d);
        }
    }

    Ok(RecipeResult {
        dish_name: text_field(&fields, dish_name_key),
        encouragement: text_field(&fields, encouragement_key),
        time: text_field(&fields, time_key),
        difficulty,
        ingredients,
        steps,
        tip: text_field(&fields, tip_key),
    })
}

pub fn fallback_recipe(original: &IngredientList) -> RecipeResult {
    RecipeResult {
        dish_name: Some("おまかせ炒め".to_string()),
        encouragement: Some("今日も頑張ってる！💪".to_string()),
        time: Some("15分".to_string()),
        difficulty: Some("簡単".to_string()),
        ingredients: original.leading(FALLBACK_INGREDIENT_COUNT),
        steps: FALLBACK_RECIPE_STEPS.iter().map(|s| s.to_string()).collect(),
        tip: Some("あるもので作るのが一番！".to_string()),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(scalar_text)
}

// None when absent, not an array, or nothing usable survives.
fn string_list(fields: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = fields.get(key)?.as_array()?.iter().filter_map(scalar_text).collect();
    (!items.is_empty()).then_some(items)
}
