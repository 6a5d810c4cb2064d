//! Suggestion Generator: asks the language model for structured gap-analysis
//! suggestions and guarantees at least three valid ones come back.
//!
//! Model output is untrusted free text. The first well-formed JSON array in the
//! response is validated against the suggestion schema; on failure the model is
//! asked once more, then a fixed fallback set is substituted. Only transport
//! failures (after the client's own retries) are surfaced.

use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::prompts::{SUGGESTIONS_PROMPT_TEMPLATE, SUGGESTIONS_SYSTEM};
use crate::errors::PipelineError;
use crate::llm_client::prompts::{JSON_ARRAY_ONLY, REPAIR_INSTRUCTION};
use crate::llm_client::{CompletionRequest, LanguageModel};
use crate::models::analysis::{Impact, Suggestion, SuggestionCategory};

pub const MIN_SUGGESTIONS: usize = 3;
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 2000;
/// Extra model calls allowed when the response fails validation.
const MAX_PARSE_RETRIES: usize = 1;

/// Fills the template placeholders in a single pass. Substituted text is
/// never rescanned, so a literal `{job_text}` inside a résumé stays as-is.
fn fill_prompt(resume_text: &str, job_text: &str) -> String {
    let template = SUGGESTIONS_PROMPT_TEMPLATE;
    let mut prompt = String::with_capacity(template.len() + resume_text.len() + job_text.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{resume_text}") {
            prompt.push_str(resume_text);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{job_text}") {
            prompt.push_str(job_text);
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }
    prompt.push_str(rest);
    prompt
}

pub async fn generate_suggestions(
    llm: &dyn LanguageModel,
    resume_text: &str,
    job_text: &str,
) -> Result<Vec<Suggestion>, PipelineError> {
    let system = format!("{SUGGESTIONS_SYSTEM} {JSON_ARRAY_ONLY}");
    let prompt = fill_prompt(resume_text, job_text);
    let repair_prompt = format!("{prompt}\n\n{REPAIR_INSTRUCTION}");

    for attempt in 0..=MAX_PARSE_RETRIES {
        let request = CompletionRequest {
            system: &system,
            prompt: if attempt == 0 { &prompt } else { &repair_prompt },
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let raw = llm
            .complete(&request)
            .await
            .map_err(|e| PipelineError::SuggestionServiceUnavailable(e.to_string()))?;

        match parse_suggestions(&raw) {
            Ok(suggestions) => {
                info!("Model returned {} valid suggestions", suggestions.len());
                return Ok(suggestions);
            }
            Err(err) => warn!(
                "Suggestion attempt {}/{}: {err}",
                attempt + 1,
                MAX_PARSE_RETRIES + 1
            ),
        }
    }

    warn!("Model output unusable; substituting fallback suggestions");
    Ok(fallback_suggestions())
}

/// Validates a raw model response into suggestions, assigning fresh ids.
pub fn parse_suggestions(raw: &str) -> Result<Vec<Suggestion>, PipelineError> {
    let items = extract_json_array(raw).ok_or_else(|| {
        PipelineError::SchemaValidation("no JSON array found in model response".to_string())
    })?;

    let suggestions = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            validate_item(item)
                .map_err(|why| PipelineError::SchemaValidation(format!("item {i}: {why}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if suggestions.len() < MIN_SUGGESTIONS {
        return Err(PipelineError::SchemaValidation(format!(
            "expected at least {MIN_SUGGESTIONS} suggestions, got {}",
            suggestions.len()
        )));
    }
    Ok(suggestions)
}

fn validate_item(item: &Value) -> Result<Suggestion, String> {
    let object = item.as_object().ok_or("not an object")?;
    let field = |name: &str| string_field(object, name);

    let category_label = field("category")?;
    let category = SuggestionCategory::from_label(category_label)
        .ok_or_else(|| format!("unknown category '{category_label}'"))?;
    let impact_label = field("impact")?;
    let impact =
        Impact::from_label(impact_label).ok_or_else(|| format!("unknown impact '{impact_label}'"))?;

    Ok(Suggestion {
        id: Uuid::new_v4(),
        category,
        suggestion: field("suggestion")?.to_string(),
        details: field("details")?.to_string(),
        impact,
    })
}

fn string_field<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a str, String> {
    object
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing or empty '{name}'"))
}

/// Returns the first substring that is a balanced `[...]` and parses as a JSON array.
///
/// Brackets inside JSON strings are ignored while balancing, so prose around
/// the array (or a stray `[` before it) does not derail extraction.
pub fn extract_json_array(raw: &str) -> Option<Vec<Value>> {
    raw.match_indices('[').find_map(|(start, _)| {
        let end = balanced_end(raw, start)?;
        serde_json::from_str::<Vec<Value>>(&raw[start..=end]).ok()
    })
}

fn balanced_end(raw: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in raw.bytes().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Generic suggestions used when the model's output cannot be validated.
pub fn fallback_suggestions() -> Vec<Suggestion> {
    let generic = [
        (
            SuggestionCategory::Skills,
            "Highlight relevant technical skills",
            "Add a dedicated technical skills section listing the tools and technologies the job description asks for.",
            Impact::High,
        ),
        (
            SuggestionCategory::Experience,
            "Quantify your achievements",
            "Support experience statements with measurable results such as percentages, time saved or team size.",
            Impact::High,
        ),
        (
            SuggestionCategory::Keywords,
            "Mirror keywords from the job description",
            "Use the exact terms from the posting where they truthfully describe your experience.",
            Impact::Medium,
        ),
    ];

    generic
        .into_iter()
        .map(|(category, suggestion, details, impact)| Suggestion {
            id: Uuid::new_v4(),
            category,
            suggestion: suggestion.to_string(),
            details: details.to_string(),
            impact,
        })
        .collect()
}
