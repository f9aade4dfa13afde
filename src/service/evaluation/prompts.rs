//! Instruction composition for judge calls

use crate::model::{EvaluationRequest, LabelKind, Rubric, ScenarioRecord};
use crate::service::evaluation::heuristics::HeuristicReport;

/// Supporting evidence gathered before the evaluation call
#[derive(Debug, Default, Clone, Copy)]
pub struct Evidence<'a> {
    /// Output of running the candidate's prompt against the scenario data
    pub answer: Option<&'a str>,
    pub heuristics: Option<&'a HeuristicReport>,
}

fn push_section(out: &mut String, heading: &str, body: &str) {
    out.push_str(heading);
    out.push_str(":\n");
    out.push_str(body.trim_end());
    out.push_str("\n\n");
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let body = items
        .iter()
        .map(|i| format!("- {}", i.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    push_section(out, heading, &body);
}

fn push_scenario_context(out: &mut String, scenario: &ScenarioRecord) {
    for field in &scenario.context {
        push_section(out, &field.label.to_uppercase(), &field.text);
    }
}

/// Build the evaluation instruction sent to the judge
pub fn compose(
    rubric: &Rubric,
    scenario: &ScenarioRecord,
    request: &EvaluationRequest,
    evidence: Evidence<'_>,
) -> String {
    let mut out = String::new();

    out.push_str(rubric.preamble.trim());
    out.push_str("\n\n");

    out.push_str(&format!("SCENARIO: {}\n", scenario.title));
    out.push_str(&format!("DESCRIPTION: {}\n\n", scenario.description));
    push_scenario_context(&mut out, scenario);
    out.push_str(&format!("QUESTION: {}\n\n", scenario.instruction.trim()));
    push_list(&mut out, "REQUIREMENTS", &scenario.requirements);
    push_list(&mut out, "A CORRECT ANSWER INVOLVES", &scenario.expectations);
    if let Some(reference) = &scenario.reference_answer {
        push_section(&mut out, "EXPECTED ANSWER", reference);
    }

    if let Some(answer) = evidence.answer {
        push_section(&mut out, "ANSWER PRODUCED BY THE USER'S PROMPT", answer);
    }
    if let Some(report) = evidence.heuristics {
        push_list(
            &mut out,
            "AUTOMATED CHECKS (hints only, your own judgment decides the scores)",
            &report.notes(),
        );
    }

    for extra in &request.extras {
        push_section(&mut out, &extra.label.to_uppercase(), &extra.value);
    }
    push_section(&mut out, &rubric.submission_label, &request.submission);

    out.push_str("EVALUATION CRITERIA (score each out of 100):\n");
    for (i, criterion) in rubric.criteria.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}: {}\n",
            i + 1,
            criterion.title,
            criterion.description
        ));
    }
    out.push('\n');

    if !rubric.scoring_bands.is_empty() {
        out.push_str("SCORING GUIDE:\n");
        for band in &rubric.scoring_bands {
            out.push_str(&format!(
                "- {}-{} ({}): {}\n",
                band.min,
                band.max,
                band.level,
                band.guidance.trim()
            ));
        }
        out.push('\n');
    }

    push_list(&mut out, "EXAMPLES OF STRONG ANSWERS", &rubric.examples.strong);
    push_list(&mut out, "EXAMPLES OF WEAK ANSWERS", &rubric.examples.weak);

    out.push_str(&output_format(rubric));
    out
}

/// JSON skeleton the judge must fill in
fn output_format(rubric: &Rubric) -> String {
    let mut fields: Vec<String> = rubric
        .criteria
        .iter()
        .map(|c| format!("  \"{}\": <score 0-100>", c.name))
        .collect();

    fields.push("  \"feedback\": \"<detailed feedback on the submission>\"".to_string());
    if rubric.suggestions {
        fields.push(
            "  \"suggestions\": [\"<suggestion 1>\", \"<suggestion 2>\", \"<suggestion 3>\"]"
                .to_string(),
        );
    }
    for label in &rubric.labels {
        let value = match label.kind {
            LabelKind::Text => format!("\"{}\"", label.hint),
            LabelKind::List => label.hint.clone(),
        };
        fields.push(format!("  \"{}\": {}", label.name, value));
    }

    format!(
        "Respond with a single JSON object in exactly this format and nothing else:\n{{\n{}\n}}\n",
        fields.join(",\n")
    )
}

/// Build the instruction that runs the candidate's prompt against the scenario data
pub fn build_answer_prompt(scenario: &ScenarioRecord, submission: &str) -> String {
    let mut out = String::new();
    push_scenario_context(&mut out, scenario);
    out.push_str(submission.trim());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssessmentType;
    use crate::service::catalog::RubricRegistry;

    fn rubric(assessment: AssessmentType) -> std::sync::Arc<Rubric> {
        RubricRegistry::embedded().unwrap().get(assessment).unwrap()
    }

    #[test]
    fn test_sections_appear_in_order() {
        let rubric = rubric(AssessmentType::DataAnalysis);
        let scenario = rubric.catalog.lookup("employee_analysis");
        let request = EvaluationRequest::new("employee_analysis", "Pivot tables in Excel")
            .with_extra("Dataset context", "HR export");

        let text = compose(&rubric, scenario, &request, Evidence::default());

        let order = [
            rubric.preamble.lines().next().unwrap(),
            "SCENARIO:",
            "QUESTION:",
            "A CORRECT ANSWER INVOLVES:",
            "DATASET CONTEXT:",
            "Pivot tables in Excel",
            "EVALUATION CRITERIA",
            "SCORING GUIDE:",
            "Respond with a single JSON object",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|needle| text.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn test_output_format_lists_every_key() {
        let rubric = rubric(AssessmentType::Productivity);
        let format = output_format(&rubric);

        for name in rubric.criterion_names() {
            assert!(format.contains(&format!("\"{name}\": <score 0-100>")));
        }
        assert!(format.contains("\"feedback\""));
        assert!(format.contains("\"suggestions\""));
        assert!(format.contains("\"recommended_tools\": [\"<tool 1>\""));
        assert!(format.contains("\"efficiency_gain\": \"<High/Medium/Low/Minimal>\""));
    }

    #[test]
    fn test_prompt_rubric_has_no_suggestions_key() {
        let rubric = rubric(AssessmentType::PromptEngineering);
        assert!(!output_format(&rubric).contains("suggestions"));
    }

    #[test]
    fn test_evidence_is_included() {
        let rubric = rubric(AssessmentType::PromptEngineering);
        let scenario = rubric.catalog.lookup("district_listing");
        let request = EvaluationRequest::new("district_listing", "List people by district");

        let text = compose(
            &rubric,
            scenario,
            &request,
            Evidence {
                answer: Some("Gasabo: Jean Bosco Nkurunziza"),
                heuristics: None,
            },
        );

        assert!(text.contains("EXPECTED ANSWER:\nBased on the data table:"));
        assert!(text.contains("ANSWER PRODUCED BY THE USER'S PROMPT:\nGasabo: Jean Bosco Nkurunziza"));
        assert!(text.contains("USER'S PROMPT:\nList people by district"));
    }

    #[test]
    fn test_answer_prompt_carries_scenario_data() {
        let rubric = rubric(AssessmentType::PromptEngineering);
        let scenario = rubric.catalog.lookup("district_listing");

        let text = build_answer_prompt(scenario, "  Group names by district ");
        assert!(text.starts_with("DATA TABLE:\nID | First Name"));
        assert!(text.ends_with("Group names by district"));
        assert!(!text.contains("Under each district"));
    }
}
