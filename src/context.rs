//! Question-context formatter: renders the caller's structured question,
//! submission, and access data into the "Known Question Materials" prompt
//! block. Pure data-to-string transform; returns `None` when inputs are absent.

use crate::{Result, TutorError};
use serde::Deserialize;
use serde_json::Value;

// ─── questionSubmissionSummary ──────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LatestSubmission {
    pub universal_response_area_id: Option<String>,
    pub answer: Option<String>,
    pub submission: Option<String>,
    pub feedback: Option<String>,
    pub raw_response: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionSummaryEntry {
    pub published_part_id: Option<String>,
    pub published_part_position: Option<i64>,
    pub published_response_area_id: Option<String>,
    pub published_response_area_position: Option<i64>,
    pub response_area_universal_id: Option<String>,
    pub published_response_area_pre_response_text: Option<String>,
    pub published_response_type: Option<String>,
    pub published_response_config: Option<Value>,
    pub total_submissions: Option<i64>,
    pub total_wrong_submissions: Option<i64>,
    pub latest_submission: Option<LatestSubmission>,
}

// ─── questionInformation ────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseAreaDetails {
    pub id: Option<String>,
    pub position: Option<i64>,
    pub universal_response_area_id: Option<String>,
    pub pre_response_text: Option<String>,
    pub response_type: Option<String>,
    pub answer: Option<Value>,
    #[serde(rename = "Response")]
    pub response: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkedSolutionSection {
    pub position: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartDetails {
    pub published_part_id: Option<String>,
    pub published_part_position: Option<i64>,
    pub published_part_content: Option<String>,
    pub published_part_answer_content: Option<String>,
    pub published_worked_solution_sections: Vec<WorkedSolutionSection>,
    pub published_response_areas: Vec<ResponseAreaDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionInformation {
    pub set_number: Option<i64>,
    pub set_name: Option<String>,
    pub set_description: Option<String>,
    pub question_number: Option<i64>,
    pub question_title: Option<String>,
    pub question_guidance: Option<String>,
    pub question_content: Option<String>,
    pub duration_lower_bound: Option<i64>,
    pub duration_upper_bound: Option<i64>,
    pub parts: Vec<PartDetails>,
}

// ─── questionAccessInformation ──────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentPart {
    pub id: Option<String>,
    pub position: Option<i64>,
    pub time_taken_part: Option<String>,
    pub marked_done_part: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessInformation {
    pub estimated_minimum_time: Option<String>,
    /// Wire name preserves the upstream spelling.
    #[serde(rename = "estimaredMaximumTime")]
    pub estimated_maximum_time: Option<String>,
    pub time_taken: Option<String>,
    pub access_status: Option<String>,
    pub marked_done: Option<String>,
    pub current_part: CurrentPart,
}

/// Wrapper for the `question_response_details` parameter as received from the
/// caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionResponseDetails {
    pub question_submission_summary: Vec<SubmissionSummaryEntry>,
    pub question_information: Option<QuestionInformation>,
    pub question_access_information: Option<AccessInformation>,
}

/// Parse and render the caller's `question_response_details` JSON blob.
/// A malformed blob is an internal error; an absent/empty one renders nothing.
pub fn render_question_details(details: &Value) -> Result<Option<String>> {
    if details.is_null() || details.as_object().is_some_and(|o| o.is_empty()) {
        return Ok(None);
    }

    let parsed: QuestionResponseDetails = serde_json::from_value(details.clone())
        .map_err(|e| {
            TutorError::Internal(format!("the question response details could not be parsed: {e}"))
        })?;

    Ok(format_question_context(
        &parsed.question_submission_summary,
        parsed.question_information.as_ref(),
        parsed.question_access_information.as_ref(),
    ))
}

/// 0-based part position rendered as a lowercase letter: 0 → 'a'.
fn index_letter(index: i64) -> char {
    char::from_u32(('a' as i64 + index.clamp(0, 25)) as u32).unwrap_or('a')
}

/// Render the "Known Question Materials" block. Returns `None` when any of the
/// three inputs is absent.
pub fn format_question_context(
    submission_summary: &[SubmissionSummaryEntry],
    question_information: Option<&QuestionInformation>,
    access_information: Option<&AccessInformation>,
) -> Option<String> {
    if submission_summary.is_empty() {
        return None;
    }
    let info = question_information?;
    let access = access_information?;

    let current_letter = index_letter(access.current_part.position.unwrap_or(0));

    let mut out = format!(
        "This is the question I am currently working on. I am currently working on Part ({current_letter}). \
Below, you'll find its details, including the parts of the question, my responses for each response area, \
and the feedback I received. This information highlights my efforts and progress so far. Use this \
information to inform your understanding about the question materials provided to me and my work on them.\n\
Maths equations are in KaTex format, preserve them the same. Use British English spellings.\n"
    );

    if let (Some(set_name), Some(set_number)) = (&info.set_name, info.set_number) {
        out.push_str(&format!("# Question Set {}: {set_name};\n", set_number + 1));
    }

    let question_label = match (info.set_number, info.question_number) {
        (Some(s), Some(q)) => format!(" {}.{}", s + 1, q + 1),
        _ => String::new(),
    };
    out.push_str(&format!(
        "# Question{question_label}: {};\n",
        info.question_title.as_deref().unwrap_or("Untitled")
    ));
    out.push_str(&format!(
        "Guidance to Solve the Question: {};\n",
        info.question_guidance.as_deref().unwrap_or("None")
    ));
    out.push_str(&format!(
        "Description of Question: {};\n",
        info.question_content.as_deref().unwrap_or("None")
    ));
    match (info.duration_lower_bound, info.duration_upper_bound) {
        (Some(lo), Some(hi)) => out.push_str(&format!(
            "Expected Time to Complete the Question: {lo} - {hi} min;\n"
        )),
        _ => out.push_str("Expected Time to Complete the Question: No specified duration.\n"),
    }
    out.push_str(&format!(
        "Time Spent on the Question today: {}{}{};\n",
        access.time_taken.as_deref().unwrap_or("No recorded duration"),
        access
            .access_status
            .as_deref()
            .map(|s| format!(" which is {s}"))
            .unwrap_or_default(),
        access
            .marked_done
            .as_deref()
            .map(|s| format!(" {s}"))
            .unwrap_or_default(),
    ));

    for part in &info.parts {
        out.push('\n');
        out.push_str(&format_part(part, &access.current_part, submission_summary));
    }

    // Clean up escaped spaces and collapsed blank lines from rich-text content.
    let cleaned = out
        .replace("&#x20;&#x20;", "")
        .replace("&#x20", "")
        .replace("\n\n", "\n");

    Some(cleaned)
}

fn format_part(
    part: &PartDetails,
    current: &CurrentPart,
    submission_summary: &[SubmissionSummaryEntry],
) -> String {
    let letter = index_letter(part.published_part_position.unwrap_or(0));
    let is_current =
        current.id.is_some() && current.id == part.published_part_id;

    let mut out = String::new();
    out.push_str(&format!(
        "# {}Part ({letter}):\n",
        if is_current { "[CURRENTLY WORKING ON] " } else { "" }
    ));
    if is_current {
        out.push_str(&format!(
            "Time spent on this part: {};\n",
            current
                .time_taken_part
                .as_deref()
                .unwrap_or("No recorded duration")
        ));
    }
    out.push_str(&format!(
        "Part Content: {};\n",
        part.published_part_content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("No content")
    ));

    for area in &part.published_response_areas {
        out.push_str(&format_response_area(area, submission_summary));
    }

    match part
        .published_part_answer_content
        .as_deref()
        .filter(|a| !a.is_empty())
    {
        Some(answer) => out.push_str(&format!("Final Part Answer: {answer}\n")),
        None => out.push_str("No direct answer\n"),
    }

    if part.published_worked_solution_sections.is_empty() {
        out.push_str(&format!("No worked solutions for part ({letter});\n"));
    } else {
        for ws in &part.published_worked_solution_sections {
            out.push_str(&format!(
                "## Worked Solution {}: {}\n{}\n",
                ws.position.unwrap_or(0) + 1,
                ws.title.as_deref().unwrap_or(""),
                ws.content
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or("No content")
            ));
        }
    }

    out
}

fn format_response_area(
    area: &ResponseAreaDetails,
    submission_summary: &[SubmissionSummaryEntry],
) -> String {
    let submissions: Vec<String> = submission_summary
        .iter()
        .filter(|entry| {
            entry.published_response_area_id.is_some()
                && entry.published_response_area_id == area.id
        })
        .filter_map(|entry| {
            let latest = entry.latest_submission.as_ref()?;
            Some(format!(
                "Latest Response: {};\nLatest Feedback Received: {};\nTotal Responses: {};\nTotal Wrong Responses: {};\n",
                latest.submission.as_deref().unwrap_or("none"),
                latest.feedback.as_deref().unwrap_or("none"),
                entry.total_submissions.unwrap_or(0),
                entry.total_wrong_submissions.unwrap_or(0),
            ))
        })
        .collect();

    let submission_details = if submissions.is_empty() {
        "Latest Response: none made;".to_string()
    } else {
        submissions.join("\n")
    };

    let mut out = format!("## Response Area: {}\n", area.position.unwrap_or(0) + 1);
    if let Some(pre) = area.pre_response_text.as_deref().filter(|p| !p.is_empty()) {
        out.push_str(&format!("Area task: What is {pre} ?\n"));
    }
    out.push_str(&format!(
        "(Secret) Expected Answer: {};\n",
        area.answer
            .as_ref()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "None".to_string())
    ));
    out.push_str(&submission_details);
    out.push('\n');
    out
}
