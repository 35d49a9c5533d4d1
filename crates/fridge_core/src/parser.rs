//! crates/fridge_core/src/parser.rs
//!
//! Interprets a `ModelReply` into a typed outcome. Never fails: a malformed but
//! present reply becomes a `ParseFailure` carrying the raw payload, and free text
//! becomes a `Fallback`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::error::Category;
use tracing::warn;

use crate::domain::{ExtractedIngredient, IngredientOutcome, Recipe, RecipeOutcome, RecipeSet};
use crate::ports::ModelReply;

pub const RECIPE_FUNCTION: &str = "create_recipe_list";
pub const INGREDIENT_FUNCTION: &str = "extract_ingredients";

const PARSE_ERROR: &str = "Failed to parse function call arguments";

/// The three shapes a reply can take once the expected function name is known.
enum Interpreted<T> {
    Parsed(T),
    Failed { error: String, raw_arguments: String },
    Text(String),
}

fn interpret<T: DeserializeOwned>(reply: ModelReply, expected_function: &str) -> Interpreted<T> {
    match reply {
        ModelReply::FunctionCall { name, arguments } if name != expected_function => {
            warn!(%name, expected = expected_function, "model called an unexpected function");
            Interpreted::Failed {
                error: format!("Unexpected function call '{name}'"),
                raw_arguments: arguments,
            }
        }
        ModelReply::FunctionCall { arguments, .. } => {
            match serde_json::from_str::<T>(&arguments) {
                Ok(parsed) => Interpreted::Parsed(parsed),
                Err(e) => {
                    warn!(error = %e, "function call arguments did not parse");
                    let error = match e.classify() {
                        Category::Data => {
                            format!("Function call arguments are missing required fields: {e}")
                        }
                        _ => PARSE_ERROR.to_string(),
                    };
                    Interpreted::Failed {
                        error,
                        raw_arguments: arguments,
                    }
                }
            }
        }
        ModelReply::Text(content) => {
            warn!("no function call was used");
            Interpreted::Text(content.trim().to_string())
        }
    }
}

//=========================================================================================
// Recipes
//=========================================================================================

#[derive(Deserialize)]
struct RawRecipe {
    name: String,
    ingredients: String,
    steps: String,
}

#[derive(Deserialize)]
struct RawRecipeList {
    recipe1: RawRecipe,
    recipe2: RawRecipe,
    recipe3: RawRecipe,
}

impl RawRecipe {
    fn into_recipe(self, slot: &str) -> Result<Recipe, String> {
        if self.name.trim().is_empty() {
            return Err(format!("{slot} has an empty name"));
        }
        if self.steps.trim().is_empty() {
            return Err(format!("{slot} has no steps"));
        }
        Ok(Recipe {
            name: self.name,
            ingredients: split_ingredients(&self.ingredients),
            steps: self.steps,
        })
    }
}

impl RawRecipeList {
    fn into_set(self) -> Result<RecipeSet, String> {
        Ok(RecipeSet {
            recipe1: self.recipe1.into_recipe("recipe1")?,
            recipe2: self.recipe2.into_recipe("recipe2")?,
            recipe3: self.recipe3.into_recipe("recipe3")?,
        })
    }
}

/// The model returns ingredients as one comma-separated string.
fn split_ingredients(ingredients: &str) -> Vec<String> {
    ingredients
        .split(", ")
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_recipe_reply(reply: ModelReply) -> RecipeOutcome {
    let raw_arguments = match &reply {
        ModelReply::FunctionCall { arguments, .. } => arguments.clone(),
        ModelReply::Text(_) => String::new(),
    };

    match interpret::<RawRecipeList>(reply, RECIPE_FUNCTION) {
        Interpreted::Parsed(list) => {
            match list.into_set() {
                Ok(set) => RecipeOutcome::Recipes(set),
                Err(error) => {
                    warn!(%error, "recipe payload incomplete");
                    RecipeOutcome::ParseFailure {
                        error,
                        raw_arguments,
                    }
                }
            }
        }
        Interpreted::Failed {
            error,
            raw_arguments,
        } => RecipeOutcome::ParseFailure {
            error,
            raw_arguments,
        },
        Interpreted::Text(content) => RecipeOutcome::Fallback(content),
    }
}

//=========================================================================================
// Ingredients
//=========================================================================================

#[derive(Deserialize)]
struct RawIngredientList {
    #[serde(default)]
    ingredients: Vec<ExtractedIngredient>,
}

pub fn parse_ingredient_reply(reply: ModelReply) -> IngredientOutcome {
    match interpret::<RawIngredientList>(reply, INGREDIENT_FUNCTION) {
        Interpreted::Parsed(list) if list.ingredients.is_empty() => IngredientOutcome::NoneDetected,
        Interpreted::Parsed(list) => IngredientOutcome::Ingredients(list.ingredients),
        Interpreted::Failed {
            error,
            raw_arguments,
        } => IngredientOutcome::ParseFailure {
            error,
            raw_arguments,
        },
        Interpreted::Text(content) => IngredientOutcome::Fallback(content),
    }
}
