//! Prompt templates sent to the language model.
//!
//! Templates use `{placeholder}` markers filled by [`render`].

use crate::catalog::TestType;
use crate::search::DurationFilter;

/// Rewrites a free-text hiring request into the catalog document format.
///
/// Placeholders: `{query}`, `{test_types}`.
pub const REFINE_PROMPT_TEMPLATE: &str = "\
the user query is {query}
You are a search query optimizer for a testing solutions database.
The database contains records with these fields:
- Name: Testing solution names
- Description: Detailed description of the test
- Test Type: Categories like {test_types}
- Job Levels: Target job levels (Entry-level, Mid-Professional, Manager, etc.)
- Languages: Available languages
- Assessment Length: Duration of the test in minutes. If nothing is mentioned, do not use this field. For a query like \"about an hour\" the assessment length should be <=60.
If the query says something like 30-40 mins then the assessment length should be 30-40.
If the query says something like can be completed in 40 mins then the assessment length should be <=40.

Always include a description of the assessment in the refined query.
Spoken languages in the query should be kept in the Languages field.
Multiple test types should be separated by commas.
Given the user query, extract the key search terms and criteria relevant to finding matching assessments.
Format your response as a clean, refined search query that highlights the most important requirements.
Do not output any explanation or additional text, only give the refined query.

Example -

Name: .NET MVC (New)
Description: knowledge of Model-View-Controller (MVC) architecture, validation and .NET framework.
Test Type: Knowledge & Skills
Job Levels: Mid-Professional, Professional Individual Contributor
Languages: English (USA)
Assessment Length: 17
";

/// Asks for the distinct skills a request is hiring for.
///
/// Placeholders: `{max}`, `{query}`.
pub const SKILL_EXTRACTION_PROMPT_TEMPLATE: &str = "\
Identify at most {max} distinct skills or competencies that the following hiring request asks to assess.
Answer with the skills only, as a single comma-separated line, without numbering or explanation.

Request: {query}
";

/// Replaces each `{key}` with its value. Unknown markers are left as is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

/// Fills [`REFINE_PROMPT_TEMPLATE`].
pub fn refine_prompt(query: &str) -> String {
    let test_types = TestType::ALL
        .iter()
        .map(|t| format!("'{}'", t.label()))
        .collect::<Vec<_>>()
        .join(",");
    render(
        REFINE_PROMPT_TEMPLATE,
        &[("test_types", &test_types), ("query", query)],
    )
}

/// Fills [`SKILL_EXTRACTION_PROMPT_TEMPLATE`].
pub fn skill_extraction_prompt(query: &str, max: usize) -> String {
    render(
        SKILL_EXTRACTION_PROMPT_TEMPLATE,
        &[("max", &max.to_string()), ("query", query)],
    )
}

/// Builds the per-skill search text used by fan-out search.
///
/// The duration constraint of the full request, if any, is carried over
/// as a trailing `Assessment Length:` line so each skill search applies it.
pub fn skill_query(skill: &str, filter: &DurationFilter) -> String {
    let mut text = format!(
        "Looking for assessment focused on {skill}.\nDescription: Tests that evaluate {skill} capabilities."
    );
    if let Some(line) = filter.constraint_line() {
        text.push('\n');
        text.push_str(&line);
    }
    text
}
