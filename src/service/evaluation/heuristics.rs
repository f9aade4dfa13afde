//! Local pre-checks for prompt submissions
//!
//! Cheap signals computed before the judge call and handed to the judge as
//! hints. They never reject a submission on their own.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{HeuristicSettings, ScenarioRecord};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+(?:['-][a-z0-9]+)*").unwrap());

/// Findings for one submission
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicReport {
    /// Share of distinct submission words that also occur in the question text
    pub overlap: f64,
    pub copied: bool,
    pub word_count: usize,
    pub too_short: bool,
    pub has_lead_phrase: bool,
    pub score_cap: u8,
}

impl HeuristicReport {
    /// Whether the judge should be told to cap the scores
    pub fn flags_low_effort(&self) -> bool {
        self.copied || self.too_short
    }

    /// Render the findings as lines for the evaluation instruction
    pub fn notes(&self) -> Vec<String> {
        let mut notes = vec![format!(
            "Word overlap with the question text: {:.0}%",
            self.overlap * 100.0
        )];

        if self.copied {
            notes.push(
                "The prompt appears to copy the question instead of instructing the assistant."
                    .to_string(),
            );
        }
        if self.too_short {
            notes.push(format!(
                "The prompt is very short ({} words).",
                self.word_count
            ));
        }
        if !self.has_lead_phrase {
            notes.push("The prompt does not open with an instruction to the assistant.".to_string());
        }
        if self.flags_low_effort() {
            notes.push(format!(
                "Unless the prompt clearly adds its own instructions, no criterion should score above {}.",
                self.score_cap
            ));
        }

        notes
    }
}

fn words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Share of distinct submission words found in the reference text
pub fn word_overlap(submission: &str, reference: &str) -> f64 {
    let submitted: HashSet<String> = words(submission).into_iter().collect();
    if submitted.is_empty() {
        return 0.0;
    }
    let reference: HashSet<String> = words(reference).into_iter().collect();
    let shared = submitted.intersection(&reference).count();
    shared as f64 / submitted.len() as f64
}

/// Run every pre-check against one submission
pub fn analyze(
    submission: &str,
    scenario: &ScenarioRecord,
    settings: &HeuristicSettings,
) -> HeuristicReport {
    // Requirement phrasing is covered by the copy markers
    let overlap = word_overlap(submission, &scenario.instruction);

    let lowered = submission.to_lowercase();
    let has_marker = scenario
        .copy_markers
        .iter()
        .any(|m| !m.trim().is_empty() && lowered.contains(&m.to_lowercase()));

    let word_count = words(submission).len();

    HeuristicReport {
        overlap,
        copied: overlap > settings.overlap_threshold || has_marker,
        word_count,
        too_short: word_count < settings.min_words,
        has_lead_phrase: settings.lead_phrases.is_match(submission),
        score_cap: settings.score_cap,
    }
}
