//! Keyword Gap: deterministic term overlap between résumé and job description.
//!
//! Reported next to the embedding score in `results`; it never affects the
//! score itself.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Terms kept per document, ranked by frequency.
const MAX_KEYWORDS: usize = 25;
/// Below this match score the résumé is told to borrow more job vocabulary.
const LOW_MATCH_THRESHOLD: f64 = 0.6;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "all", "also", "an", "and", "any", "are", "as",
    "at", "be", "been", "being", "both", "but", "by", "can", "could", "did", "do", "does", "each",
    "etc", "for", "from", "had", "has", "have", "he", "her", "his", "how", "if", "in", "including",
    "into", "is", "it", "its", "may", "me", "more", "most", "must", "my", "new", "no", "not", "of",
    "on", "one", "or", "other", "our", "out", "over", "per", "plus", "should", "so", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "through", "to", "under", "up", "us", "using", "very", "was", "we", "well", "were", "what",
    "when", "where", "which", "while", "who", "will", "with", "within", "work", "would", "year",
    "years", "you", "your",
];

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "c++", "c#", "node.js" survive; a trailing period does not.
    RE.get_or_init(|| Regex::new(r"[a-z][a-z0-9+#]*(?:\.[a-z0-9+#]+)*").expect("valid regex"))
}

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Skills split by whether the résumé covers each job keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillsAnalysis {
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordReport {
    pub resume_keywords: Vec<String>,
    pub job_keywords: Vec<String>,
    pub skills_analysis: SkillsAnalysis,
    /// Share of job keywords found in the résumé, 0.0 – 1.0.
    pub keyword_coverage: f64,
    pub recommendations: Vec<String>,
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    token_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.len() >= 2 && !stop_words().contains(t.as_str()))
}

/// The most frequent non-stop-word terms, ties broken by first appearance.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, token) in tokens(&lowered).enumerate() {
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(limit).map(|(token, ..)| token).collect()
}

/// Compares job keywords against every term of the résumé and derives
/// recommendations from the gaps and the match score.
pub fn analyze_keywords(resume_text: &str, job_text: &str, match_score: f64) -> KeywordReport {
    let resume_lowered = resume_text.to_lowercase();
    let resume_terms: HashSet<String> = tokens(&resume_lowered).collect();
    let job_keywords = extract_keywords(job_text, MAX_KEYWORDS);

    let (matched_skills, missing_skills): (Vec<String>, Vec<String>) = job_keywords
        .iter()
        .cloned()
        .partition(|keyword| resume_terms.contains(keyword));

    let keyword_coverage = if job_keywords.is_empty() {
        0.0
    } else {
        matched_skills.len() as f64 / job_keywords.len() as f64
    };

    let recommendations = build_recommendations(&resume_lowered, match_score, &missing_skills);

    KeywordReport {
        resume_keywords: extract_keywords(resume_text, MAX_KEYWORDS),
        job_keywords,
        skills_analysis: SkillsAnalysis {
            matched_skills,
            missing_skills,
        },
        keyword_coverage,
        recommendations,
    }
}

fn build_recommendations(resume_lowered: &str, match_score: f64, missing: &[String]) -> Vec<String> {
    let mut recommendations = Vec::new();

    if match_score < LOW_MATCH_THRESHOLD {
        recommendations
            .push("Consider adding more relevant keywords from the job description".to_string());
    }
    if !missing.is_empty() {
        let top: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();
        recommendations.push(format!(
            "Address these job description terms if they apply to you: {}",
            top.join(", ")
        ));
    }
    if !resume_lowered.contains("skills") {
        recommendations.push("Add a clear skills section to your resume".to_string());
    }
    if !resume_lowered.contains("experience") {
        recommendations.push("Include detailed work experience".to_string());
    }
    recommendations
}
