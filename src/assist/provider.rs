//! OpenAI-compatible chat-completions transport for the assist flows.
//! Works against any endpoint speaking that protocol; the base URL, model
//! and key come from [`AssistConfig`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AssistConfig;
use crate::model::category;

use super::{
    AnalyzeReceiptRequest, AssistError, CategorySuggester, CategorySuggestion, ReceiptAnalyzer,
    ReceiptFields, SuggestCategoryRequest,
};

const RECEIPT_PROMPT: &str = "You are an expert receipt analyzer. Analyze the attached receipt \
image and extract the total amount, the date, and a brief summary for the notes. Respond with a \
single JSON object: {\"amount\": <number>, \"date\": \"YYYY-MM-DD\", \"notes\": <string>}. If you \
cannot determine a value, use a sensible default (0 for the amount, today's date, or \"N/A\" for \
the notes) instead of refusing.";

pub struct LlmProvider {
    config: AssistConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

impl LlmProvider {
    pub fn new(config: AssistConfig) -> Result<Self, AssistError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AssistError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AssistError::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: 0.2,
            max_tokens: 512,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(AssistError::Transport(format!("{status}: {text}")));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistError::Protocol(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AssistError::Protocol("reply carried no choices".to_string()))
    }
}

#[async_trait]
impl ReceiptAnalyzer for LlmProvider {
    async fn analyze_receipt(
        &self,
        request: AnalyzeReceiptRequest,
    ) -> Result<ReceiptFields, AssistError> {
        let messages = vec![ChatMessage {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: RECEIPT_PROMPT.to_string() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: request.receipt_data_uri },
                },
            ]),
        }];
        let reply = self.complete(messages).await?;
        Ok(receipt_fields_from_reply(&reply))
    }
}

#[async_trait]
impl CategorySuggester for LlmProvider {
    async fn suggest_category(
        &self,
        request: SuggestCategoryRequest,
    ) -> Result<CategorySuggestion, AssistError> {
        let options: Vec<&str> = category::CATEGORIES.iter().map(|c| c.label).collect();
        let prompt = format!(
            "Given the following expense description, suggest an appropriate category for the \
             expense from the available options.\n\nOptions: {}\n\nDescription: {}\n\nRespond \
             with a single JSON object: {{\"category\": \"<option>\"}}.",
            options.join(", "),
            request.description,
        );
        let messages = vec![ChatMessage { role: "user", content: MessageContent::Text(prompt) }];
        let reply = self.complete(messages).await?;
        Ok(suggestion_from_reply(&reply))
    }
}

/// Pulls the first top-level JSON object out of a reply that may wrap it in
/// prose or a code fence.
fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    serde_json::from_str(text.get(start..=end)?).ok()
}

fn today_iso() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Field-level degradation: a reply missing or mangling one field still
/// yields usable output, per the flow contract.
fn receipt_fields_from_reply(reply: &str) -> ReceiptFields {
    let value = extract_json(reply);

    let amount = value
        .as_ref()
        .and_then(|v| v.get("amount"))
        .and_then(Value::as_f64)
        .and_then(Decimal::from_f64)
        .filter(|a| !a.is_sign_negative())
        .unwrap_or(Decimal::ZERO);

    let date = value
        .as_ref()
        .and_then(|v| v.get("date"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(today_iso);

    let notes = value
        .as_ref()
        .and_then(|v| v.get("notes"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "N/A".to_string());

    ReceiptFields { amount, date, notes }
}

/// Suggestion replies are expected as `{"category": <label>}`; a bare label
/// without the JSON wrapper is accepted too. Whether the label maps to a
/// registry value is the caller's concern.
fn suggestion_from_reply(reply: &str) -> CategorySuggestion {
    let category = extract_json(reply)
        .and_then(|v| v.get("category").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| reply.trim().trim_matches('"').to_string());
    CategorySuggestion { category }
}
