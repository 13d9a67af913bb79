//! Prompt templates for the three assistant actions.
//!
//! Every template quotes the caller's subject and body verbatim; the body is
//! fenced with `"""` so the model can tell instructions from quoted mail.
//! The `Subject:`/`Body:` output layout requested by reply and improve is a
//! convention with the model only. See [`crate::reply`] for the optional parse.

use crate::action::{ActionKind, ActionRequest, Tone};

pub const BODY_FENCE: &str = "\"\"\"";

pub fn build_prompt(request: &ActionRequest) -> String {
    match request.kind {
        ActionKind::Reply => reply_prompt(request),
        ActionKind::Summarize => summarize_prompt(request),
        ActionKind::Improve => improve_prompt(request),
    }
}

fn reply_prompt(request: &ActionRequest) -> String {
    let tone = tone_phrase(request.effective_tone());
    let subject_line = match request.draft.subject() {
        Some(subject) => format!("Original subject: \"{}\"", subject),
        None => "No subject provided".to_string(),
    };

    format!(
        r#"Write an email reply{tone} responding to the following message.
{subject_line}
Original message:
{fence}
{body}
{fence}
Create an appropriate subject line for your reply and write the response{tone}. Maintain the same language as the original message.
Output exactly in this format:
Subject: [your reply subject line]
Body: [your reply email content starting with greeting and ending with closing]"#,
        tone = tone,
        subject_line = subject_line,
        fence = BODY_FENCE,
        body = request.draft.body,
    )
}

fn summarize_prompt(request: &ActionRequest) -> String {
    let subject_part = match request.draft.subject() {
        Some(subject) => format!(" (Subject: \"{}\")", subject),
        None => String::new(),
    };

    format!(
        r#"Summarize the following email{subject_part} in 2-3 concise sentences.
Email content:
{fence}
{body}
{fence}
Focus only on the substantive content: the main purpose, key information, and any required actions. Exclude greetings, pleasantries, thank-yous, and sign-offs. Write as a brief paragraph in the same language as the original email."#,
        subject_part = subject_part,
        fence = BODY_FENCE,
        body = request.draft.body,
    )
}

fn improve_prompt(request: &ActionRequest) -> String {
    let tone = request.effective_tone().unwrap_or_default();
    let (subject_line, subject_rule) = match request.draft.subject() {
        Some(subject) => (
            format!("Current subject: \"{}\"", subject),
            "Revise the subject line if needed",
        ),
        None => (
            "No subject provided".to_string(),
            "Create an appropriate subject line",
        ),
    };

    format!(
        r#"Rewrite this email draft in a {tone} tone so it is clear and well-structured.
{subject_line}
Draft:
{fence}
{body}
{fence}
Instructions:
- If the draft is a brief phrase or incomplete thought, expand it into a complete email with a proper greeting, body paragraphs, and closing
- If the draft is already an email, improve its grammar, clarity, structure, {tone} tone, and conciseness
- Maintain the same language as the original draft
- Work only with the information provided: do not add placeholders, brackets, or instructions for the user to fill in
- If details are vague, keep them vague rather than adding placeholder text
- {subject_rule}

Output exactly in this format:
Subject: [your improved subject line]
Body: [your complete email content]"#,
        tone = tone.id(),
        subject_line = subject_line,
        fence = BODY_FENCE,
        body = request.draft.body,
        subject_rule = subject_rule,
    )
}

fn tone_phrase(tone: Option<Tone>) -> String {
    match tone {
        Some(tone) => format!(" in a {} tone", tone.id()),
        None => String::new(),
    }
}
