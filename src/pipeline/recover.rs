//! Response recovery: extract question/answer pairs from model output,
//! however malformed.
//!
//! ## Why a chain?
//!
//! Even well-prompted chat models sometimes wrap the JSON in prose, leave
//! object keys unquoted, or abandon JSON entirely and write
//! `question: "...", answer: "..."` lines. Each stage below is strictly
//! more permissive (and less structured) than the previous one, and the
//! function never fails outward — any parse error at a stage simply
//! advances to the next stage. The worst case is a single card echoing
//! the slide text so the user can review it by hand.
//!
//! ## Stage Order
//!
//! 1. Whole response as a JSON array of `{question, answer}` objects
//! 2. First bracketed-array substring, after two textual repairs
//!    (quote bare keys, normalise spacing inside quoted values)
//! 3. Pattern scan for `question: "...", answer: "..."` pairs
//! 4. Separate loose question/answer fragment scans, zipped positionally
//! 5. One synthetic pair echoing the full slide text
//!
//! Stages must not leak into one another: a response parseable at stage 1
//! never undergoes the stage-2 repairs (which would corrupt valid values
//! containing `word:` shapes).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A bare question/answer pair, before slide stamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

// ── Stage 2: bracketed array + textual repairs ──────────────────────────

static RE_JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").unwrap());

// Quote bare object keys: `question:` → `"question":`. Quoted keys are
// untouched because the closing quote sits between the word and the colon.
static RE_BARE_KEYS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+):").unwrap());

// Normalise spacing between a colon and a quoted value.
static RE_VALUE_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r#":\s*"([^"]*)""#).unwrap());

// ── Stage 3: question/answer pair pattern ───────────────────────────────

static RE_QA_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)["']?question["']?\s*:\s*["'](.*?)["']\s*,\s*["']?answer["']?\s*:\s*["'](.*?)["']"#,
    )
    .unwrap()
});

// ── Stage 4: loose single-field fragments (no dot-matches-newline) ──────

static RE_LOOSE_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"question["']?:[\s"']*(.+?)[\s"']*,"#).unwrap());

static RE_LOOSE_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"answer["']?:[\s"']*(.+?)[\s"']*[},]"#).unwrap());

/// Recover a non-empty list of question/answer pairs from a model
/// response.
///
/// `slide_text` is the original prompt text, used only for the stage-5
/// synthetic pair. This function never fails and never returns an empty
/// vector.
pub fn recover_pairs(response: &str, slide_text: &str) -> Vec<QaPair> {
    // Stage 1: the whole response is valid JSON.
    if let Ok(pairs) = serde_json::from_str::<Vec<QaPair>>(response) {
        if !pairs.is_empty() {
            debug!("Recovered {} pairs at stage 1 (strict JSON)", pairs.len());
            return pairs;
        }
    }

    // Stage 2: find an embedded array and repair common formatting slips.
    if let Some(m) = RE_JSON_ARRAY.find(response) {
        let repaired = RE_BARE_KEYS.replace_all(m.as_str(), "\"$1\":");
        let repaired = RE_VALUE_SPACING.replace_all(&repaired, ": \"$1\"");
        if let Ok(pairs) = serde_json::from_str::<Vec<QaPair>>(&repaired) {
            if !pairs.is_empty() {
                debug!("Recovered {} pairs at stage 2 (repaired JSON)", pairs.len());
                return pairs;
            }
        }
    }

    // Stage 3: textual question/answer pairs.
    let pairs: Vec<QaPair> = RE_QA_PAIR
        .captures_iter(response)
        .map(|c| QaPair {
            question: c[1].trim().to_string(),
            answer: c[2].trim().to_string(),
        })
        .collect();
    if !pairs.is_empty() {
        debug!("Recovered {} pairs at stage 3 (pattern scan)", pairs.len());
        return pairs;
    }

    // Stage 4: independent fragment scans, zipped positionally. Knowingly
    // fragile: when the two counts differ for reasons other than true
    // absence, a question can pair with an unrelated answer. Preserved
    // as-is — intent beyond best-effort recovery is unspecified.
    let questions: Vec<String> = RE_LOOSE_QUESTION
        .captures_iter(response)
        .map(|c| strip_quotes(&c[1]))
        .collect();
    let answers: Vec<String> = RE_LOOSE_ANSWER
        .captures_iter(response)
        .map(|c| strip_quotes(&c[1]))
        .collect();

    let pairs: Vec<QaPair> = questions
        .into_iter()
        .zip(answers)
        .map(|(question, answer)| QaPair { question, answer })
        .collect();
    if !pairs.is_empty() {
        debug!("Recovered {} pairs at stage 4 (loose fragments)", pairs.len());
        return pairs;
    }

    // Stage 5: give the user something to review.
    debug!("Recovery exhausted; emitting verbatim-echo pair");
    vec![QaPair {
        question: "Review this slide".to_string(),
        answer: slide_text.to_string(),
    }]
}

/// Remove stray quote characters left behind by the loose fragment scans.
fn strip_quotes(s: &str) -> String {
    s.replace(['"', '\''], "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = "Title: Vi\n\nContent: modes";

    fn pair(q: &str, a: &str) -> QaPair {
        QaPair {
            question: q.into(),
            answer: a.into(),
        }
    }

    // ── Stage 1 ─────────────────────────────────────────────────────────

    #[test]
    fn wellformed_json_array_parses_exactly() {
        let response = r#"[
            {"question": "What is vi?", "answer": "A modal text editor"},
            {"question": "Who wrote vi?", "answer": "Bill Joy"}
        ]"#;
        let pairs = recover_pairs(response, SLIDE);
        assert_eq!(
            pairs,
            vec![
                pair("What is vi?", "A modal text editor"),
                pair("Who wrote vi?", "Bill Joy"),
            ]
        );
    }

    #[test]
    fn stage1_result_never_undergoes_stage2_repairs() {
        // The answer contains a `word:` shape that the bare-key repair
        // would mangle into `"note":` if stage 2 ever ran.
        let response = r#"[{"question": "Q", "answer": "see note: 5 for details"}]"#;
        let pairs = recover_pairs(response, SLIDE);
        assert_eq!(pairs[0].answer, "see note: 5 for details");
    }

    #[test]
    fn stage1_ignores_extra_object_keys() {
        let response = r#"[{"question": "Q", "answer": "A", "difficulty": "easy"}]"#;
        assert_eq!(recover_pairs(response, SLIDE), vec![pair("Q", "A")]);
    }

    #[test]
    fn empty_json_array_falls_through_to_echo() {
        let pairs = recover_pairs("[]", SLIDE);
        assert_eq!(pairs, vec![pair("Review this slide", SLIDE)]);
    }

    // ── Stage 2 ─────────────────────────────────────────────────────────

    #[test]
    fn embedded_array_with_prose_is_found() {
        let response = r#"Here are your flashcards:
[{"question": "Q1", "answer": "A1"}]
Hope that helps!"#;
        assert_eq!(recover_pairs(response, SLIDE), vec![pair("Q1", "A1")]);
    }

    #[test]
    fn bare_keys_are_repaired() {
        let response = r#"Sure! [{question: "Q1", answer: "A1"}]"#;
        assert_eq!(recover_pairs(response, SLIDE), vec![pair("Q1", "A1")]);
    }

    // ── Stage 3 ─────────────────────────────────────────────────────────

    #[test]
    fn textual_pairs_are_scanned() {
        let response = concat!(
            "question: \"What is a mode?\", answer: \"An editor state\"\n",
            "question: \"Name two modes\", answer: \"Insert and normal\"\n",
        );
        let pairs = recover_pairs(response, SLIDE);
        assert_eq!(
            pairs,
            vec![
                pair("What is a mode?", "An editor state"),
                pair("Name two modes", "Insert and normal"),
            ]
        );
    }

    #[test]
    fn single_quoted_keys_are_tolerated() {
        let response = r#"'question': 'Q1', 'answer': 'A1'"#;
        assert_eq!(recover_pairs(response, SLIDE), vec![pair("Q1", "A1")]);
    }

    // ── Stage 4 ─────────────────────────────────────────────────────────

    #[test]
    fn loose_fragments_zip_to_shorter_length() {
        // Two questions but only one parseable answer; pairing is
        // positional up to the shorter list.
        let response = "question: Q1,\nquestion: Q2,\nanswer: A1}\n";
        let pairs = recover_pairs(response, SLIDE);
        assert_eq!(pairs, vec![pair("Q1", "A1")]);
    }

    #[test]
    fn loose_fragments_strip_stray_quotes() {
        let response = "question: \"What?, answer: 'Because'}";
        let pairs = recover_pairs(response, SLIDE);
        assert_eq!(pairs.len(), 1);
        assert!(!pairs[0].question.contains('"'));
        assert!(!pairs[0].answer.contains('\''));
    }

    // ── Stage 5 ─────────────────────────────────────────────────────────

    #[test]
    fn unrecognizable_text_yields_verbatim_echo() {
        let pairs = recover_pairs("I cannot help with that.", SLIDE);
        assert_eq!(pairs, vec![pair("Review this slide", SLIDE)]);
    }

    #[test]
    fn never_returns_empty() {
        for garbage in ["", "{}", "null", "[1, 2, 3]", "[\"a\"]"] {
            assert!(
                !recover_pairs(garbage, SLIDE).is_empty(),
                "empty result for {garbage:?}"
            );
        }
    }
}
