//! crates/fridge_core/src/preferences.rs
//!
//! Turns `RecipePreferences` into the constraint lines of the recipe prompt.

use crate::domain::{CookingTime, Difficulty, RecipePreferences};

/// One line per constrained field, always in the order
/// vegan, spicy, cuisines, allergens, cooking time, difficulty, fridge-only.
pub fn preference_fragments(preferences: &RecipePreferences) -> Vec<String> {
    let mut fragments = Vec::new();

    if preferences.is_vegan {
        fragments.push("- User prefers VEGAN recipes only.".to_string());
    }
    if preferences.is_spicy {
        fragments.push("- User prefers SPICY recipes.".to_string());
    }
    if !preferences.cuisines.is_empty() {
        fragments.push(format!(
            "- User prefers these cuisines: {}.",
            preferences.cuisines.join(", ")
        ));
    }
    if !preferences.allergens.is_empty() {
        fragments.push(format!(
            "- User CANNOT have these allergens: {}. DO NOT include these in any recipes.",
            preferences.allergens.join(", ")
        ));
    }
    if let Some(time) = preferences.cooking_time {
        fragments.push(cooking_time_fragment(time).to_string());
    }
    if let Some(difficulty) = preferences.difficulty {
        fragments.push(difficulty_fragment(difficulty).to_string());
    }
    if preferences.use_only_fridge_ingredients {
        fragments.push(
            "- User prefers recipes that only use ingredients available in their fridge."
                .to_string(),
        );
    }

    fragments
}

fn cooking_time_fragment(time: CookingTime) -> &'static str {
    match time {
        CookingTime::Any => "- User prefers recipes that can be made in any amount of time.",
        CookingTime::Quick => {
            "- User prefers recipes that can be made in a short amount of time (less than 30 minutes)."
        }
        CookingTime::Medium => {
            "- User prefers recipes that can be made in a medium amount of time (about 30-60 minutes)."
        }
        CookingTime::Long => {
            "- User has enough time to make recipes that take a long time (more than 60 minutes)."
        }
    }
}

fn difficulty_fragment(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "- User prefers recipes that are easy to make.",
        Difficulty::Medium => "- User prefers recipes of medium difficulty.",
        Difficulty::Hard => "- User prefers recipes requiring advanced cooking techniques.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_produce_no_constraints() {
        assert!(preference_fragments(&RecipePreferences::default()).is_empty());
    }

    #[test]
    fn fields_render_in_fixed_order() {
        let prefs = RecipePreferences {
            is_vegan: true,
            is_spicy: true,
            cuisines: vec!["Thai".into(), "Mexican".into()],
            allergens: vec!["peanut".into()],
            cooking_time: Some(CookingTime::Quick),
            difficulty: Some(Difficulty::Hard),
            use_only_fridge_ingredients: true,
        };
        let lines = preference_fragments(&prefs);

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "- User prefers VEGAN recipes only.");
        assert_eq!(lines[1], "- User prefers SPICY recipes.");
        assert_eq!(lines[2], "- User prefers these cuisines: Thai, Mexican.");
        assert!(lines[3].contains("peanut"));
        assert!(lines[4].contains("less than 30 minutes"));
        assert!(lines[5].contains("advanced"));
        assert!(lines[6].contains("only use ingredients"));
    }

    #[test]
    fn empty_lists_contribute_nothing() {
        let prefs = RecipePreferences {
            allergens: vec!["gluten".into()],
            ..Default::default()
        };
        let lines = preference_fragments(&prefs);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("- User CANNOT have these allergens: gluten."));
    }

    #[test]
    fn identical_input_gives_identical_text() {
        let prefs = RecipePreferences {
            is_spicy: true,
            cuisines: vec!["Korean".into()],
            difficulty: Some(Difficulty::Easy),
            ..Default::default()
        };
        assert_eq!(
            preference_fragments(&prefs).join("\n"),
            preference_fragments(&prefs.clone()).join("\n")
        );
    }
}
