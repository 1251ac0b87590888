use crate::models::IngredientList;

/// Keys the reply must carry, in the order the prompt lists them. `parse_recipe` reads them from here.
pub const RECIPE_FIELDS: [&str; 7] = ["dishName", "encouragement", "time", "difficulty", "ingredients", "steps", "tip"];

const OUTPUT_FORMAT: &str = r#"{
  "dishName": "料理名",
  "encouragement": "疲れた主婦への短い励ましメッセージ（絵文字付きで20文字以内）",
  "time": "調理時間（例：15分）",
  "difficulty": "簡単/普通/ちょっと頑張る",
  "ingredients": ["使う食材1", "使う食材2"],
  "steps": ["手順1", "手順2", "手順3"],
  "tip": "ワンポイントアドバイス"
}"#;

pub fn build_prompt(ingredients: &IngredientList) -> String {
    format!(
        "あなたは優しい料理の先生です。疲れた主婦を元気づけるように、温かく励ましながらレシピを教えてください。\n\
         \n\
         以下の食材を使った簡単で美味しい料理を1つ提案してください：\n\
         {list}\n\
         \n\
         【重要】\n\
         - 必ず「JSONのみ」を返してください（前後に文章・コードブロック禁止）\n\
         - 値はすべて日本語\n\
         - steps は3〜6個\n\
         - ingredients は上の入力食材から中心に選んでOK（全部使わなくていい）\n\
         \n\
         出力フォーマット：\n\
         {OUTPUT_FORMAT}",
        list = ingredients.joined("、"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IngredientsInput;
    use crate::recipe::normalize_ingredients;

    fn prompt_for(raw: &str) -> String {
        build_prompt(&normalize_ingredients(IngredientsInput::Delimited(raw.into())).unwrap())
    }

    #[test]
    fn lists_ingredients_with_ideographic_comma() {
        assert!(prompt_for("卵,ツナ\nキャベツ").contains("\n卵、ツナ、キャベツ\n"));
    }

    #[test]
    fn names_every_field_in_order() {
        let prompt = prompt_for("卵");
        let positions: Vec<usize> = RECIPE_FIELDS
            .iter()
            .map(|f| prompt.find(&format!("\"{f}\"")).unwrap_or_else(|| panic!("missing field {f}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "fields out of order: {positions:?}");
    }

    #[test]
    fn forbids_prose_and_fences() {
        let prompt = prompt_for("卵");
        assert!(prompt.contains("JSONのみ"));
        assert!(prompt.contains("コードブロック禁止"));
        assert!(prompt.contains("steps は3〜6個"));
        assert!(!prompt.starts_with('\n') && !prompt.ends_with('\n'));
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(prompt_for("卵、ツナ"), prompt_for("卵、ツナ"));
    }
}
