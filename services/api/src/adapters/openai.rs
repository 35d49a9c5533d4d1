//! services/api/src/adapters/openai.rs
//!
//! This module contains the adapter for any OpenAI-compatible chat completion API.
//! It implements the `LanguageModel` port from the `core` crate.

use std::future::Future;
use std::time::Duration;

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fridge_core::ports::{LanguageModel, ModelReply, ModelRequest, PortError, PortResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LanguageModel` with one fixed model name.
#[derive(Clone)]
pub struct OpenAiModelAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiModelAdapter {
    /// Creates a new `OpenAiModelAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }

    /// The JSON body of a chat completion call that forces `request.function`.
    fn request_body(&self, request: &ModelRequest) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }

        let user_content = match &request.image {
            Some(image) => json!([
                { "type": "text", "text": request.prompt },
                { "type": "image_url", "image_url": { "url": data_url(&image.bytes) } }
            ]),
            None => json!(request.prompt),
        };
        messages.push(json!({ "role": "user", "content": user_content }));

        json!({
            "model": self.model,
            "messages": messages,
            "functions": [{
                "name": request.function.name,
                "description": request.function.description,
                "parameters": request.function.parameters,
            }],
            "function_call": { "name": request.function.name },
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        })
    }
}

//=========================================================================================
// Wire format of the response
//=========================================================================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

/// Reads the first choice. Legacy `function_call` wins over `tool_calls`, and
/// either wins over plain content.
fn interpret_response(response: ChatResponse) -> PortResult<ModelReply> {
    let choice = response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .ok_or_else(|| PortError::UnexpectedResponseFormat("response has no choices".into()))?;
    let message = choice
        .message
        .ok_or_else(|| PortError::UnexpectedResponseFormat("choice has no message".into()))?;

    let call = message.function_call.or_else(|| {
        message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|call| call.function)
    });
    if let Some(call) = call {
        return Ok(ModelReply::FunctionCall {
            name: call.name,
            arguments: call.arguments,
        });
    }

    match message.content {
        Some(content) if !content.trim().is_empty() => Ok(ModelReply::Text(content)),
        _ => Err(PortError::UnexpectedResponseFormat(
            "message has neither a function call nor content".into(),
        )),
    }
}

fn map_openai_error(e: OpenAIError) -> PortError {
    match e {
        OpenAIError::JSONDeserialize(..) => PortError::UnexpectedResponseFormat(e.to_string()),
        other => PortError::Transport(other.to_string()),
    }
}

//=========================================================================================
// Image encoding
//=========================================================================================

/// Guesses the image type from its leading bytes; unknown data is sent as JPEG.
fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'B', b'M', ..] => "image/bmp",
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => "image/tiff",
        _ => "image/jpeg",
    }
}

fn data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

/// Runs one API call under `limit`. An elapsed deadline is a transport failure.
async fn within<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, OpenAIError>>,
) -> PortResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| PortError::Transport("timed out".to_string()))?
        .map_err(map_openai_error)
}

//=========================================================================================
// `LanguageModel` Trait Implementation
//=========================================================================================

#[async_trait]
impl LanguageModel for OpenAiModelAdapter {
    #[instrument(skip(self, request), fields(model = %self.model, function = %request.function.name))]
    async fn complete(&self, request: ModelRequest) -> PortResult<ModelReply> {
        let body = self.request_body(&request);

        let response: ChatResponse =
            within(self.timeout, self.client.chat().create_byot(body)).await?;

        let reply = interpret_response(response)?;
        debug!(
            function_call = matches!(reply, ModelReply::FunctionCall { .. }),
            "model replied"
        );
        Ok(reply)
    }
}
