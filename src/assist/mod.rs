//! AI assist collaborators: receipt photo → structured fields, and free-text
//! description → category suggestion. Both are fallible remote calls; the
//! caller decides whether to retry. Suggestions and extracted fields only
//! ever populate form fields, they never commit a record.

mod provider;

pub use provider::LlmProvider;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Callers require at least this many characters of description before
/// asking for a category suggestion.
pub const MIN_SUGGESTION_DESCRIPTION: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeReceiptRequest {
    /// `data:<mimetype>;base64,<encoded>` image payload.
    pub receipt_data_uri: String,
}

/// Extracted receipt fields. Uncertain fields arrive as defaults (amount 0,
/// today's date, "N/A" notes) rather than failing the call; the date stays
/// a string so consumers can apply their own fallback for unparseable
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptFields {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestCategoryRequest {
    pub description: String,
}

/// A single label drawn from the registry's label enumeration. The caller
/// maps it back to a registry value case-insensitively and treats a miss as
/// "no suggestion".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: String,
}

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("assist is not configured: {0}")]
    Configuration(String),
    #[error("assist request failed: {0}")]
    Transport(String),
    #[error("assist returned an unusable reply: {0}")]
    Protocol(String),
}

#[async_trait]
pub trait ReceiptAnalyzer: Send + Sync {
    async fn analyze_receipt(
        &self,
        request: AnalyzeReceiptRequest,
    ) -> Result<ReceiptFields, AssistError>;
}

#[async_trait]
pub trait CategorySuggester: Send + Sync {
    async fn suggest_category(
        &self,
        request: SuggestCategoryRequest,
    ) -> Result<CategorySuggestion, AssistError>;
}

/// Wraps raw image bytes as the data-URI shape the receipt flow expects.
pub fn encode_receipt_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}
