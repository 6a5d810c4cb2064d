//! Optimization Applier: deterministic, rule-based rewriting of résumé text.
//!
//! A selection of suggestions is reduced to a set of rules, each applied once
//! in a fixed order, followed by a formatting cleanup pass. The same text and
//! selection always produce the same output.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::models::analysis::{Suggestion, SuggestionCategory};

pub const SKILLS_HEADER: &str = "TECHNICAL SKILLS";
pub const QUANTIFY_CLAUSE: &str = " with demonstrated success in delivering projects 20% ahead of schedule";
const INDUSTRY_PREFIX: &str = "relevant industry ";
const CERTIFICATIONS_SECTION: &str = "CERTIFICATIONS\n- [Add relevant certifications here]";

/// Rewrites the applier knows. Ordering is application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rule {
    Skills,
    Quantify,
    Industry,
    Certifications,
}

fn quantity_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b\d+\+?\s*(?:years?|yrs?)(?:\s+of)?\s+experience(?:\s+(?:in|with|at)\s+[^.,;:!?\n]+)?",
        )
        .expect("valid regex")
    })
}

fn industry_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:experience|worked|background)\s+(?:in|with|at)\s").expect("valid regex")
    })
}

fn bullet_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^([ \t]*)(?:[\x{2022}\x{25AA}\x{25CF}][ \t]*|[*+-][ \t]+)").expect("valid regex")
    })
}

fn sentence_break_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([.!?])[ \t]+([A-Za-z])").expect("valid regex"))
}

fn newline_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

/// Maps one suggestion to the rules its category and title call for.
fn rules_for(suggestion: &Suggestion) -> Vec<Rule> {
    let title = suggestion.suggestion.to_lowercase();
    let mut rules = Vec::new();

    if suggestion.category == SuggestionCategory::Skills || title.contains("skills") {
        rules.push(Rule::Skills);
    }
    if title.contains("quantif") || title.contains("achievement") || title.contains("metric") {
        rules.push(Rule::Quantify);
    }
    if title.contains("industry") || title.contains("relevant experience") {
        rules.push(Rule::Industry);
    }
    if title.contains("certification") {
        rules.push(Rule::Certifications);
    }
    rules
}

/// The deduplicated, ordered rule set for a selection.
pub fn select_rules(selected: &[Suggestion]) -> BTreeSet<Rule> {
    selected.iter().flat_map(rules_for).collect()
}

pub fn apply_optimizations(text: &str, selected: &[Suggestion]) -> String {
    let mut output = text.to_string();

    for rule in select_rules(selected) {
        output = match rule {
            Rule::Skills => add_skills_header(&output),
            Rule::Quantify => quantify_experience(&output),
            Rule::Industry => highlight_industry(&output),
            Rule::Certifications => add_certifications(&output),
        };
    }

    cleanup_formatting(&output)
}

fn add_skills_header(text: &str) -> String {
    if text.to_lowercase().contains("technical skills") {
        text.to_string()
    } else {
        format!("{SKILLS_HEADER}\n{text}")
    }
}

/// Appends the qualifying clause after each "<N> years of experience [in X]"
/// that does not already carry it.
fn quantify_experience(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for m in quantity_pattern().find_iter(text) {
        output.push_str(&text[last..m.end()]);
        let already = m.as_str().contains(QUANTIFY_CLAUSE.trim_start())
            || text[m.end()..].starts_with(QUANTIFY_CLAUSE);
        if !already {
            output.push_str(QUANTIFY_CLAUSE);
        }
        last = m.end();
    }
    output.push_str(&text[last..]);
    output
}

/// Prefixes "experience/worked/background in|with|at" with "relevant industry".
fn highlight_industry(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for m in industry_pattern().find_iter(text) {
        let before = &text[last..m.start()];
        output.push_str(before);
        let prefixed = ends_with_ignore_case(&text[..m.start()], INDUSTRY_PREFIX);
        if !prefixed {
            output.push_str(INDUSTRY_PREFIX);
        }
        output.push_str(m.as_str());
        last = m.end();
    }
    output.push_str(&text[last..]);
    output
}

fn ends_with_ignore_case(text: &str, suffix: &str) -> bool {
    let (text, suffix) = (text.as_bytes(), suffix.as_bytes());
    text.len() >= suffix.len() && text[text.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn add_certifications(text: &str) -> String {
    if text.to_lowercase().contains("certifications") {
        text.to_string()
    } else {
        format!("{text}\n\n{CERTIFICATIONS_SECTION}")
    }
}

/// Normalizes bullet markers to "- ", breaks lines after sentence-ending
/// punctuation, collapses blank-line runs and trims.
pub fn cleanup_formatting(text: &str) -> String {
    let text = bullet_pattern().replace_all(text, |caps: &Captures| format!("{}- ", &caps[1]));
    let text = sentence_break_pattern().replace_all(&text, "$1\n$2");
    let text = newline_runs().replace_all(&text, "\n\n");
    text.trim().to_string()
}
