use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Difficulty labels the prompt asks for. Not enforced on the way back.
pub const KNOWN_DIFFICULTIES: [&str; 3] = ["簡単", "普通", "ちょっと頑張る"];

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RecipeRequest {
    /// Either an array of strings or one delimited string; anything else is rejected later.
    #[serde(default)]
    pub ingredients: Value,
}

/// The two accepted spellings of an ingredient list, decided once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngredientsInput {
    List(Vec<String>),
    Delimited(String),
    /// Null, numbers, objects and so on. Always normalizes to an empty-ingredients error.
    Unsupported,
}

impl From<Value> for IngredientsInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Delimited(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        other => {
                            tracing::debug!("dropping non-string ingredient entry: {}", other);
                            None
                        }
                    })
                    .collect(),
            ),
            _ => Self::Unsupported,
        }
    }
}

/// Ordered, trimmed, non-empty ingredient names. Only built through normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientList(Vec<String>);

impl IngredientList {
    pub(crate) fn new_unchecked(items: Vec<String>) -> Self {
        debug_assert!(!items.is_empty());
        Self(items)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The first `n` ingredients, in input order.
    pub fn leading(&self, n: usize) -> Vec<String> {
        self.0.iter().take(n).cloned().collect()
    }

    pub fn joined(&self, sep: &str) -> String {
        self.0.join(sep)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dish_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encouragement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn input_variant_is_decided_by_json_type() {
        assert_eq!(IngredientsInput::from(json!("卵、ツナ")), IngredientsInput::Delimited("卵、ツナ".into()));
        assert_eq!(
            IngredientsInput::from(json!(["卵", 3, "ツナ", null])),
            IngredientsInput::List(vec!["卵".into(), "ツナ".into()])
        );
        assert_eq!(IngredientsInput::from(json!(null)), IngredientsInput::Unsupported);
        assert_eq!(IngredientsInput::from(json!({"a": 1})), IngredientsInput::Unsupported);
        assert_eq!(IngredientsInput::from(json!(42)), IngredientsInput::Unsupported);
    }

    #[test]
    fn missing_ingredients_field_defaults_to_null() {
        let req: RecipeRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.ingredients, Value::Null);
    }

    #[test]
    fn recipe_serializes_with_camel_case_and_skips_missing_text() {
        let recipe = RecipeResult {
            dish_name: Some("ツナ玉丼".into()),
            ingredients: vec!["卵".into()],
            steps: vec!["焼く".into()],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&recipe).unwrap(),
            json!({ "dishName": "ツナ玉丼", "ingredients": ["卵"], "steps": ["焼く"] })
        );
    }

    #[test]
    fn leading_takes_at_most_n() {
        let list = IngredientList::new_unchecked(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(list.leading(2), vec!["a", "b"]);
        assert_eq!(list.leading(5), vec!["a", "b", "c"]);
        assert_eq!(list.joined("、"), "a、b、c");
    }
}
