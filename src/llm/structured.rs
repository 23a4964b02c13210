//! Structured generation with bounded retry
//!
//! Models asked for JSON regularly wrap it in markdown fences, truncate it or
//! emit a shape that decodes but is semantically empty. [`generate_structured`]
//! asks again with the same messages until the output decodes into `T` and
//! passes [`Validate`], or the attempt budget runs out.

use crate::llm::client::LLMClient;
use crate::types::{AppError, ConversationMessage, Result};
use crate::utils::cancel::cancellable;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Post-decode checks a structured value must pass.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// A decoded value together with the cleaned text it came from.
#[derive(Debug, Clone)]
pub struct Structured<T> {
    pub raw: String,
    pub value: T,
}

/// Trim whitespace and remove a surrounding markdown code fence, tagged
/// (```` ```json ````) or bare.
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn decode<T>(raw: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_str(raw).map_err(|e| AppError::Decode(e.to_string()))?;
    value.validate()?;
    Ok(value)
}

/// Generate JSON and decode it into `T`, retrying up to `max_attempts` times.
///
/// Generation, decode and validation failures all consume an attempt.
/// Cancellation is returned immediately.
pub async fn generate_structured<T>(
    llm: &dyn LLMClient,
    messages: &[ConversationMessage],
    max_attempts: usize,
    cancel: &CancellationToken,
) -> Result<Structured<T>>
where
    T: DeserializeOwned + Validate,
{
    if max_attempts == 0 {
        return Err(AppError::Configuration(
            "structured generation needs at least one attempt".to_string(),
        ));
    }

    let mut last_error = None;
    for attempt in 1..=max_attempts {
        let outcome = match cancellable(cancel, llm.generate_json(messages)).await {
            Ok(text) => {
                let raw = strip_code_fences(&text).to_string();
                decode::<T>(&raw).map(|value| Structured { raw, value })
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(structured) => {
                debug!(attempt, "Structured output accepted");
                return Ok(structured);
            }
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "Structured output rejected");
                last_error = Some(e);
            }
        }
    }

    Err(AppError::GenerateJson {
        attempts: max_attempts,
        source: Box::new(
            last_error.unwrap_or_else(|| AppError::Internal("no attempt recorded".to_string())),
        ),
    })
}
