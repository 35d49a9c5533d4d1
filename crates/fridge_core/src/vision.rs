//! crates/fridge_core/src/vision.rs
//!
//! Identifies food ingredients in a photo through a vision-capable model.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument};

use crate::domain::IngredientOutcome;
use crate::error::{ServiceError, ServiceResult};
use crate::parser::{parse_ingredient_reply, INGREDIENT_FUNCTION};
use crate::ports::{FunctionSpec, ImageAttachment, LanguageModel, ModelRequest};

const INSTRUCTION: &str = "Analyze this image and identify all the food ingredients you can see. \
For each ingredient, try to estimate the quantity based on what's visible in the image.";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.3;

/// Parameters schema of the `extract_ingredients` function.
pub fn ingredient_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "ingredients": {
                "type": "array",
                "description": "List of ingredients with quantities detected in the image",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Name of the ingredient"
                        },
                        "quantity": {
                            "type": "string",
                            "description": "Estimated quantity of the ingredient (e.g., '2 cups', '500g', '3 whole')"
                        }
                    },
                    "required": ["name", "quantity"]
                }
            }
        },
        "required": ["ingredients"]
    })
}

pub fn build_ingredient_request(image: Vec<u8>) -> ModelRequest {
    ModelRequest {
        system: None,
        prompt: INSTRUCTION.to_string(),
        image: Some(ImageAttachment { bytes: image }),
        function: FunctionSpec {
            name: INGREDIENT_FUNCTION.to_string(),
            description: "Extract a list of food ingredients with estimated quantities visible in the image"
                .to_string(),
            parameters: ingredient_schema(),
        },
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

#[derive(Clone)]
pub struct ImageIngredientExtractor {
    model: Arc<dyn LanguageModel>,
}

impl ImageIngredientExtractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    #[instrument(skip(self, image), fields(image_len = image.len()))]
    pub async fn extract(&self, image: Vec<u8>) -> ServiceResult<IngredientOutcome> {
        if image.is_empty() {
            return Err(ServiceError::EmptyImage);
        }

        let reply = self
            .model
            .complete(build_ingredient_request(image))
            .await
            .map_err(|e| ServiceError::from_model("image ingredient extraction", e))?;

        let outcome = parse_ingredient_reply(reply);
        if let IngredientOutcome::Ingredients(found) = &outcome {
            info!(count = found.len(), "ingredients detected");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockLanguageModel, ModelReply, PortError};

    #[tokio::test]
    async fn empty_image_fails_before_any_call() {
        let mut model = MockLanguageModel::new();
        model.expect_complete().never();
        let extractor = ImageIngredientExtractor::new(Arc::new(model));

        assert_eq!(
            extractor.extract(Vec::new()).await.unwrap_err(),
            ServiceError::EmptyImage
        );
    }

    #[tokio::test]
    async fn image_bytes_are_attached_to_the_request() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .withf(|req| {
                req.function.name == INGREDIENT_FUNCTION
                    && req.image.as_ref().map(|i| i.bytes.as_slice()) == Some(&[0xFF, 0xD8, 0xFF][..])
            })
            .times(1)
            .returning(|_| {
                Ok(ModelReply::FunctionCall {
                    name: INGREDIENT_FUNCTION.into(),
                    arguments: r#"{"ingredients": []}"#.into(),
                })
            });
        let extractor = ImageIngredientExtractor::new(Arc::new(model));

        let outcome = extractor.extract(vec![0xFF, 0xD8, 0xFF]).await.unwrap();
        assert_eq!(outcome, IngredientOutcome::NoneDetected);
    }

    #[tokio::test]
    async fn missing_choices_surface_as_unexpected_format() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Err(PortError::UnexpectedResponseFormat("no choices".into())));
        let extractor = ImageIngredientExtractor::new(Arc::new(model));

        assert!(matches!(
            extractor.extract(vec![1, 2, 3]).await.unwrap_err(),
            ServiceError::UnexpectedResponseFormat { .. }
        ));
    }
}
