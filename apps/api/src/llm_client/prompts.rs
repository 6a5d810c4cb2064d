// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that asks for a bare JSON array.
pub const JSON_ARRAY_ONLY: &str = "You MUST respond with a valid JSON array only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Sent on the second attempt after the first response could not be parsed.
pub const REPAIR_INSTRUCTION: &str = "\
    Your previous answer could not be parsed. Answer again with ONLY the JSON \
    array, using exactly the fields and allowed values described above.";
