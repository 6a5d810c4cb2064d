//! Canonical form for extracted text.
//!
//! Output invariants: only printable ASCII plus `\n`; no run of two spaces;
//! no space before a newline; at most one blank line in a row; no leading or
//! trailing whitespace. `normalize_text` is idempotent.

use std::sync::OnceLock;

use regex::Regex;

fn trailing_spaces() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" +\n").expect("valid regex"))
}

fn space_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("valid regex"))
}

fn newline_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

/// Canonicalizes whitespace, line endings and encoding artifacts.
///
/// Non-printable characters become a single space rather than being dropped,
/// so words on either side stay separate.
pub fn normalize_text(input: &str) -> String {
    let text = input.replace("\r\n", "\n").replace('\r', "\n");
    let text = text.replace('\t', "    ");

    let text: String = text
        .chars()
        .map(|c| {
            if c == '\n' || (' '..='~').contains(&c) {
                c
            } else {
                ' '
            }
        })
        .collect();

    let text = trailing_spaces().replace_all(&text, "\n");
    let text = space_runs().replace_all(&text, " ");
    let text = newline_runs().replace_all(&text, "\n\n");

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "plain text",
        "Jane\u{00a0}Doe\u{2022}Engineer",
        "line one\r\nline two\r\n\r\n\r\n\r\nline three",
        "tab\tseparated\t\tvalues",
        "a \n \n \n \nb",
        "trailing   \nspaces  \n",
        "\n\n\n\nleading and trailing\n\n\n\n",
        "caf\u{e9} r\u{e9}sum\u{e9}\u{0007}\u{001b}[0m",
        "mixed\r\rcarriage\rreturns",
        "    indented\n    - bullet one\n\t- bullet two",
        "emoji \u{1F680} rocket  \u{2014} dash",
    ];

    #[test]
    fn test_normalize_is_idempotent() {
        for sample in SAMPLES {
            let once = normalize_text(sample);
            let twice = normalize_text(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_output_is_printable_ascii_or_newline() {
        for sample in SAMPLES {
            let out = normalize_text(sample);
            assert!(
                out.chars().all(|c| c == '\n' || (' '..='~').contains(&c)),
                "unexpected character in {out:?}"
            );
        }
    }

    #[test]
    fn test_non_ascii_replaced_with_space_not_deleted() {
        assert_eq!(normalize_text("Jane\u{2022}Doe"), "Jane Doe");
    }

    #[test]
    fn test_crlf_normalized_and_blank_runs_collapsed() {
        assert_eq!(
            normalize_text("one\r\ntwo\r\n\r\n\r\n\r\nthree"),
            "one\ntwo\n\nthree"
        );
    }

    #[test]
    fn test_tabs_and_space_runs_collapse_to_single_space() {
        assert_eq!(normalize_text("a\tb    c"), "a b c");
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        assert_eq!(normalize_text("a \n \n \n \nb"), "a\n\nb");
    }

    #[test]
    fn test_trims_outer_whitespace() {
        assert_eq!(normalize_text("\n\n  hello world  \n\n"), "hello world");
    }
}
