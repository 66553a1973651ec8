//! Prompt templates built from the rubric table.
//!
//! The model classifies; it never marks. Weights stay out of the prompt and
//! all arithmetic happens in `essaymark-core`.

use essaymark_core::{Assignment, CategoryCode, FirstRound, Rubric, VocabularyLevel};

const TEACHER_ROLE: &str = "\
You are a British English teacher marking a secondary-school writing task. \
You classify the errors in a student's text; you do not give marks.";

const INSTANCE_RULES: &str = "\
- Copy every \"quote\" exactly from the student's text, a few words long.
- An \"explanation\" names the rule that was broken. Never write the corrected form.
- Each error goes in exactly one category.
- Never mention the student's name or any CEFR level (A1, B2 and so on).
- Never give a mark, points or a score.";

fn task_section(assignment: &Assignment) -> String {
    let points: Vec<String> = assignment
        .content_points
        .iter()
        .map(|p| format!("- {p}"))
        .collect();
    format!(
        "Task: {name}\n\
         Instructions: {instructions}\n\
         Required content points:\n\
         {points}",
        name = assignment.name,
        instructions = assignment.instructions,
        points = points.join("\n"),
    )
}

fn category_list(rubric: &Rubric) -> String {
    rubric
        .categories
        .iter()
        .map(|c| format!("- {}: {}", c.code.as_str(), c.rule))
        .collect::<Vec<_>>()
        .join("\n")
}

fn error_keys(rubric: &Rubric, value: &str) -> String {
    rubric
        .categories
        .iter()
        .map(|c| format!("    \"{}\": {value}", c.code.as_str()))
        .collect::<Vec<_>>()
        .join(",\n")
}

/// First-round prompt: classify every error in `essay`.
pub fn build_grading_prompt(rubric: &Rubric, assignment: &Assignment, essay: &str) -> String {
    let levels: Vec<String> = VocabularyLevel::ALL
        .iter()
        .map(|l| format!("{} = {}", l.score(), l.description()))
        .collect();

    format!(
        "{TEACHER_ROLE}\n\
         \n\
         {task}\n\
         \n\
         Error categories:\n\
         {categories}\n\
         \n\
         Rules:\n\
         {INSTANCE_RULES}\n\
         - List every linking word (and, but, because, however...) in \"connectors\", \
         once per occurrence, exactly as written.\n\
         - \"vocabulary\" is one of: {levels}.\n\
         - A required content point the essay does not cover is one missing_content entry.\n\
         \n\
         Respond ONLY with a JSON object. No markdown fences, no explanation, just raw JSON \
         with every category key present ([] when there are no errors):\n\
         {{\n  \"impression\": \"two or three sentences of overall feedback, addressed to the student\",\n  \
         \"errors\": {{\n{keys}\n  }},\n  \
         \"connectors\": [\"...\"],\n  \
         \"vocabulary\": 0\n}}\n\
         \n\
         ESSAY:\n\
         {essay}",
        task = task_section(assignment),
        categories = category_list(rubric),
        levels = levels.join("; "),
        keys = error_keys(rubric, "[{\"quote\": \"...\", \"explanation\": \"...\"}]"),
    )
}

/// Second-round prompt: audit each first-round error against the revision.
pub fn build_revision_prompt(
    rubric: &Rubric,
    assignment: &Assignment,
    first: &FirstRound,
    revised: &str,
) -> String {
    let mut flagged = Vec::new();
    for cat in &rubric.categories {
        let instances = first.payload.instances(cat.code);
        if instances.is_empty() {
            continue;
        }
        flagged.push(format!("{}:", cat.code.as_str()));
        for inst in instances {
            flagged.push(format!("- \"{}\" ({})", inst.quote, inst.explanation));
        }
    }
    let flagged = if flagged.is_empty() {
        "(none)".to_string()
    } else {
        flagged.join("\n")
    };

    let keys = rubric
        .categories
        .iter()
        .map(|c| c.code)
        .filter(|code| !first.payload.instances(*code).is_empty())
        .map(|code: CategoryCode| {
            format!(
                "    \"{}\": [{{\"quote\": \"...\", \"status\": \"fixed\", \"hint\": null}}]",
                code.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "{TEACHER_ROLE}\n\
         \n\
         {task}\n\
         \n\
         The student has revised their text. Check each error flagged in the first draft \
         against the revision.\n\
         \n\
         First draft:\n\
         {original}\n\
         \n\
         Errors flagged in the first draft, by category:\n\
         {flagged}\n\
         \n\
         Rules:\n\
         {INSTANCE_RULES}\n\
         - Give every flagged error a \"status\": \"fixed\", \"still_present\" or \"incorrectly_fixed\".\n\
         - Keep each \"quote\" as it was flagged above.\n\
         - For errors that are not fixed, add a short \"hint\" toward the fix without giving it.\n\
         - List errors that appear only in the revision in \"new_errors\".\n\
         - Say in \"vocabulary_note\" whether the vocabulary has become more or less varied.\n\
         \n\
         Respond ONLY with a JSON object. No markdown fences, no explanation, just raw JSON:\n\
         {{\n  \"summary\": \"two or three sentences on how the revision went, addressed to the student\",\n  \
         \"errors\": {{\n{keys}\n  }},\n  \
         \"new_errors\": [{{\"quote\": \"...\", \"explanation\": \"...\", \"category\": \"...\"}}],\n  \
         \"vocabulary_note\": \"...\"\n}}\n\
         \n\
         REVISED ESSAY:\n\
         {revised}",
        task = task_section(assignment),
        original = first.essay,
    )
}
