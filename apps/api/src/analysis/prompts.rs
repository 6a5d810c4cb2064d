// Prompt constants for the suggestion generator.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for gap analysis. Append `llm_client::prompts::JSON_ARRAY_ONLY`.
pub const SUGGESTIONS_SYSTEM: &str = "You are a professional resume analyzer and career coach. \
    You compare a resume against a job description and give specific, actionable \
    improvement suggestions.";

/// Gap analysis prompt. Replace `{resume_text}` and `{job_text}` before sending.
pub const SUGGESTIONS_PROMPT_TEMPLATE: &str = r#"Compare the resume below with the job description and suggest improvements that make the resume a better match.

Cover at least these areas:
1. Skills alignment: required skills the resume lacks or undersells
2. Experience relevance: how well past roles map to the job's responsibilities
3. Missing keywords: important terms from the job description absent from the resume
4. Formatting: structure, section headings, bullet consistency, readability
5. Overall fit: the single most important change for this application

Return a JSON array of 3 to 8 objects. Each object has EXACTLY these four string fields:
[
  {
    "category": "Skills",
    "suggestion": "Add missing technical skills",
    "details": "The job requires Kubernetes and Terraform; list them in a skills section if you have used them.",
    "impact": "High"
  }
]

Allowed values:
- "category": one of "Skills", "Experience", "Keywords", "Format", "Overall Fit"
- "impact": one of "High", "Medium", "Low"

Keep "suggestion" under 80 characters. Every field must be non-empty.

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_text}"#;
