//! crates/fridge_core/src/recipes.rs
//!
//! Builds the recipe-generation request from a fridge snapshot and drives the
//! call through the `LanguageModel` port.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument};

use crate::domain::{RecipeOutcome, RecipePreferences};
use crate::error::{ServiceError, ServiceResult};
use crate::inventory::InventoryService;
use crate::parser::{parse_recipe_reply, RECIPE_FUNCTION};
use crate::ports::{FunctionSpec, LanguageModel, ModelRequest};
use crate::preferences::preference_fragments;

const SYSTEM_MESSAGE: &str = "You are a helpful assistant.";
const MAX_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.5;

const TASK_INSTRUCTIONS: &str = "Propose a list of three delicious recipes that could be made from these ingredients. \
It is not mandatory to use all ingredients. For each recipe, give a short name, the ingredients required \
(should only include ingredients that the user has in their fridge) and a detailed, step by step recipe.";

const EXAMPLE_RECIPE: &str = r#"Here is an example recipe:
Broccoli Bacon Quiche

Instructions:
1. Preheat the oven to 375°F (190°C) - 5 minutes
2. Cook the chopped bacon in a skillet over medium heat until crispy (about 8-10 minutes). Remove with a slotted spoon and drain on paper towels.
3. Cut the broccoli into small florets and steam until just tender (about 4-5 minutes). Let cool slightly and then roughly chop.
4. Blind bake the pie crust for 10 minutes until lightly golden.
5. In a large bowl, whisk together the eggs, heavy cream, salt, pepper, and nutmeg until well combined (about 2 minutes of whisking).
6. Layer the bacon, chopped broccoli, and both cheeses in the pre-baked pie crust.
7. Pour the egg mixture over the filling ingredients.
8. Bake in the preheated oven for 35-40 minutes, until the center is set and the top is golden brown.
9. Let cool for 10 minutes before slicing and serving.

Ingredients:
4 strips of bacon, chopped into small pieces, 1 medium broccoli head (about 2 cups when chopped), 1/2 cup grated cheddar cheese, 1/4 cup grated parmesan cheese, 4 large eggs, 1 cup heavy cream, 1 pre-made pie crust (9-inch), 1/2 teaspoon salt, 1/4 teaspoon black pepper, 1/8 teaspoon nutmeg

Please follow this example format with detailed measurements, precise timing for each step, and complete instructions for your three recipe suggestions, but in a function calling format instead."#;

//=========================================================================================
// Request construction
//=========================================================================================

/// `"name (quantity), name (quantity), ..."` in input order.
pub fn format_ingredients(items: &[(String, i64)]) -> String {
    items
        .iter()
        .map(|(name, quantity)| format!("{name} ({quantity})"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn recipe_prompt(items: &[(String, i64)], preferences: Option<&RecipePreferences>) -> String {
    let mut prompt = format!(
        "You are a recipe creator. The user has the following ingredients in their fridge:\n{}\n",
        format_ingredients(items)
    );

    let fragments = preferences.map(preference_fragments).unwrap_or_default();
    if !fragments.is_empty() {
        prompt.push_str("\nUSER PREFERENCES (IMPORTANT):\n");
        for fragment in &fragments {
            prompt.push_str(fragment);
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str(TASK_INSTRUCTIONS);
    prompt.push_str("\n\n");
    prompt.push_str(EXAMPLE_RECIPE);
    prompt
}

fn recipe_slot(description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "description": description,
        "properties": {
            "name": {
                "type": "string",
                "description": "The short name of the recipe"
            },
            "ingredients": {
                "type": "string",
                "description": "Detailed list of ingredients required for the recipe"
            },
            "steps": {
                "type": "string",
                "description": "Detailed, step by step recipe"
            }
        },
        "required": ["name", "ingredients", "steps"]
    })
}

/// Parameters schema of the `create_recipe_list` function.
pub fn recipe_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "recipe1": recipe_slot("Information about the first recipe"),
            "recipe2": recipe_slot("Information about the second recipe"),
            "recipe3": recipe_slot("Information about the third recipe")
        },
        "required": ["recipe1", "recipe2", "recipe3"]
    })
}

/// Pure: the same ingredients and preferences always give the same request.
pub fn build_recipe_request(
    items: &[(String, i64)],
    preferences: Option<&RecipePreferences>,
) -> ModelRequest {
    ModelRequest {
        system: Some(SYSTEM_MESSAGE.to_string()),
        prompt: recipe_prompt(items, preferences),
        image: None,
        function: FunctionSpec {
            name: RECIPE_FUNCTION.to_string(),
            description: "Return three recipes, each with a short name and step by step recipe"
                .to_string(),
            parameters: recipe_schema(),
        },
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

//=========================================================================================
// Generation
//=========================================================================================

#[derive(Clone)]
pub struct RecipeGenerator {
    inventory: InventoryService,
    model: Arc<dyn LanguageModel>,
}

impl RecipeGenerator {
    pub fn new(inventory: InventoryService, model: Arc<dyn LanguageModel>) -> Self {
        Self { inventory, model }
    }

    /// Suggests three recipes from the user's current fridge.
    #[instrument(skip(self, preferences))]
    pub async fn generate(
        &self,
        user_id: &str,
        preferences: Option<&RecipePreferences>,
    ) -> ServiceResult<RecipeOutcome> {
        let items = self.inventory.snapshot(user_id).await?;
        if items.is_empty() {
            return Err(ServiceError::EmptyFridge);
        }

        let request = build_recipe_request(&items, preferences);
        let reply = self
            .model
            .complete(request)
            .await
            .map_err(|e| ServiceError::from_model("recipe generation", e))?;

        let outcome = parse_recipe_reply(reply);
        info!(
            structured = matches!(outcome, RecipeOutcome::Recipes(_)),
            "recipe generation finished"
        );
        Ok(outcome)
    }
}
