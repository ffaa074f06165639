//! Answer and summary generation against OpenAI-compatible endpoints.

use super::{ChatMessage, Role, SummaryKind, ANSWER_FALLBACK};
use crate::config::{
    require_api_key, GenerationSettings, Prompts, RagSettings, GROQ_API_KEY_ENV,
    OPENAI_API_KEY_ENV,
};
use crate::error::{Result, VidmindError};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    CreateCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Result of a generation call.
///
/// Provider failures never surface as errors: they produce a `Fallback` carrying the
/// literal placeholder text and the underlying cause.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Generated(String),
    Fallback { text: String, error: String },
}

impl Generation {
    fn from_result(result: Result<String>, fallback: &str) -> Self {
        match result {
            Ok(text) => Self::Generated(text),
            Err(e) => {
                warn!("Generation failed, using fallback: {}", e);
                Self::Fallback {
                    text: fallback.to_string(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Text to show or persist.
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Generated(_) => None,
            Self::Fallback { error, .. } => Some(error),
        }
    }
}

/// Produces answers from retrieved context.
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(&self, context: &str, history: &[ChatMessage], question: &str) -> Generation;
}

/// Produces transcript summaries.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str, kind: SummaryKind) -> Generation;
}

/// Chat-completions generator (Groq by default).
pub struct Generator {
    client: Client<OpenAIConfig>,
    settings: GenerationSettings,
    prompts: Prompts,
}

impl Generator {
    /// Create a generator using `GROQ_API_KEY`.
    pub fn new(settings: &GenerationSettings, prompts: Prompts) -> Result<Self> {
        let api_key = require_api_key(GROQ_API_KEY_ENV)?;
        Self::with_api_key(settings, prompts, &api_key)
    }

    pub fn with_api_key(
        settings: &GenerationSettings,
        prompts: Prompts,
        api_key: &str,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.base_url, api_key)?,
            settings: settings.clone(),
            prompts,
        })
    }

    fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let built: ChatCompletionRequestMessage = match message.role {
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content.clone())
                .build()?
                .into(),
        };
        Ok(built)
    }

    #[instrument(
        skip(self, messages),
        fields(model = %self.settings.model, turns = messages.len())
    )]
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        max_tokens: u32,
    ) -> Result<String> {
        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .messages(messages)
            .temperature(self.settings.temperature)
            .max_tokens(max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| VidmindError::Generation("Empty response from LLM".to_string()))?;

        debug!("Received {} chars", content.len());
        Ok(content.trim().to_string())
    }

    async fn try_answer(
        &self,
        context: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.rag.question, &vars);

        let mut messages = history
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;
        messages.push(Self::to_request_message(&ChatMessage {
            role: Role::User,
            content: prompt,
        })?);

        self.complete(messages, self.settings.answer_max_tokens).await
    }

    async fn try_summarize(&self, transcript: &str, kind: SummaryKind) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        let prompt = self
            .prompts
            .render_with_custom(kind.template(&self.prompts.summary), &vars);

        let message = Self::to_request_message(&ChatMessage {
            role: Role::User,
            content: prompt,
        })?;
        let raw = self
            .complete(vec![message], kind.max_tokens(&self.settings))
            .await?;
        Ok(kind.post_process(&raw))
    }
}

#[async_trait]
impl Answerer for Generator {
    async fn answer(&self, context: &str, history: &[ChatMessage], question: &str) -> Generation {
        Generation::from_result(
            self.try_answer(context, history, question).await,
            ANSWER_FALLBACK,
        )
    }
}

#[async_trait]
impl Summarizer for Generator {
    #[instrument(skip(self, transcript), fields(kind = %kind))]
    async fn summarize(&self, transcript: &str, kind: SummaryKind) -> Generation {
        Generation::from_result(
            self.try_summarize(transcript, kind).await,
            kind.fallback_text(),
        )
    }
}

/// Single-prompt answerer over a legacy completions endpoint.
///
/// Conversation history is not sent.
pub struct CompletionGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    prompts: Prompts,
}

impl CompletionGenerator {
    /// Create a completion generator using `OPENAI_API_KEY`.
    pub fn new(settings: &RagSettings, temperature: f32, prompts: Prompts) -> Result<Self> {
        let api_key = require_api_key(OPENAI_API_KEY_ENV)?;
        Self::with_api_key(settings, temperature, prompts, &api_key)
    }

    pub fn with_api_key(
        settings: &RagSettings,
        temperature: f32,
        prompts: Prompts,
        api_key: &str,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.completion_base_url, api_key)?,
            model: settings.completion_model.clone(),
            max_tokens: settings.completion_max_tokens,
            temperature,
            prompts,
        })
    }

    async fn try_answer(&self, context: &str, question: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.rag.completion, &vars);

        let request = CreateCompletionRequestArgs::default()
            .model(&self.model)
            .prompt(prompt)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .n(1)
            .build()?;

        let response = self.client.completions().create(request).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .ok_or_else(|| VidmindError::Generation("Empty completion response".to_string()))
    }
}

#[async_trait]
impl Answerer for CompletionGenerator {
    async fn answer(&self, context: &str, _history: &[ChatMessage], question: &str) -> Generation {
        Generation::from_result(self.try_answer(context, question).await, ANSWER_FALLBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_body(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    fn generator(server: &MockServer) -> Generator {
        let settings = GenerationSettings {
            base_url: format!("{}/openai/v1", server.uri()),
            ..GenerationSettings::default()
        };
        Generator::with_api_key(&settings, Prompts::default(), "test-key").unwrap()
    }

    #[tokio::test]
    async fn test_answer_sends_history_then_question() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "llama-3.3-70b-versatile",
                "max_tokens": 300,
                "messages": [
                    { "role": "user", "content": "earlier" },
                    { "role": "assistant", "content": "reply" },
                    { "role": "user", "content": "Context:\nctx\n\nQuestion: why?" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("  because  ")))
            .expect(1)
            .mount(&server)
            .await;

        let history = vec![
            ChatMessage { role: Role::User, content: "earlier".into() },
            ChatMessage { role: Role::Assistant, content: "reply".into() },
        ];
        let result = generator(&server).answer("ctx", &history, "why?").await;
        assert_eq!(result, Generation::Generated("because".to_string()));
    }

    #[tokio::test]
    async fn test_breakdown_summary_is_post_processed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "max_tokens": 1000 })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body("[00:00] Intro\n\n  [01:00] Main  \n")),
            )
            .mount(&server)
            .await;

        let result = generator(&server)
            .summarize("transcript", SummaryKind::Breakdown)
            .await;
        assert_eq!(result.text(), "[00:00] Intro\n\n[01:00] Main");
    }

    #[tokio::test]
    async fn test_provider_failure_yields_literal_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "bad request", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let gen = generator(&server);

        let answer = gen.answer("ctx", &[], "q").await;
        assert!(answer.is_fallback());
        assert_eq!(answer.text(), "Failed to generate answer.");
        assert!(answer.error().is_some());

        let detailed = gen.summarize("t", SummaryKind::Detailed).await;
        assert_eq!(detailed.text(), "Failed to generate detailed explanation.");
    }

    #[tokio::test]
    async fn test_completion_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(body_partial_json(json!({ "max_tokens": 256, "n": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cmpl-1",
                "object": "text_completion",
                "created": 1700000000,
                "model": "gpt-3.5-turbo-instruct",
                "choices": [{ "text": "\n42\n", "index": 0, "finish_reason": "stop" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = RagSettings {
            completion_base_url: format!("{}/v1", server.uri()),
            ..RagSettings::default()
        };
        let gen =
            CompletionGenerator::with_api_key(&settings, 0.3, Prompts::default(), "k").unwrap();
        let result = gen.answer("ctx", &[], "meaning?").await;
        assert_eq!(result.text(), "42");
    }

    #[test]
    #[serial]
    fn test_missing_key_is_config_error() {
        std::env::remove_var(GROQ_API_KEY_ENV);
        let result = Generator::new(&GenerationSettings::default(), Prompts::default());
        assert!(matches!(result, Err(VidmindError::Config(_))));
    }
}
