//! Best-effort split of a model answer into subject and body.
//!
//! The interaction state always keeps the raw text; this parse only feeds
//! presentation (subject highlighting, copying the body alone).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredReply {
    pub subject: Option<String>,
    pub body: String,
}

/// Returns `None` when the text carries no `Body:` marker.
pub fn parse_structured_reply(text: &str) -> Option<StructuredReply> {
    let lines: Vec<&str> = text.lines().collect();

    let body_idx = lines.iter().position(|line| marker_value(line, "body").is_some())?;
    let subject = lines[..body_idx]
        .iter()
        .find_map(|line| marker_value(line, "subject"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let mut body_lines = Vec::new();
    if let Some(first) = marker_value(lines[body_idx], "body") {
        let first = first.trim();
        if !first.is_empty() {
            body_lines.push(first);
        }
    }
    body_lines.extend(lines[body_idx + 1..].iter().copied());

    let body = body_lines.join("\n").trim().to_string();
    if body.is_empty() {
        return None;
    }

    Some(StructuredReply { subject, body })
}

/// Index of the `Subject:` line that belongs to a structured reply, counted
/// over `text.lines()`.
pub fn subject_line_index(text: &str) -> Option<usize> {
    parse_structured_reply(text)?.subject?;
    let lines: Vec<&str> = text.lines().collect();
    let body_idx = lines.iter().position(|line| marker_value(line, "body").is_some())?;
    lines[..body_idx]
        .iter()
        .position(|line| marker_value(line, "subject").is_some_and(|v| !v.trim().is_empty()))
}

/// Text after `<name>:` when the line starts with that label, ignoring case
/// and markdown emphasis such as `**Subject:**`.
fn marker_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let stripped = line.trim_start().trim_start_matches(['*', '#', '_', ' ']);
    if stripped.len() < name.len() || !stripped.is_char_boundary(name.len()) {
        return None;
    }
    let (head, rest) = stripped.split_at(name.len());
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = rest.trim_start_matches(['*', '_']);
    let value = rest.strip_prefix(':')?;
    Some(value.trim_start_matches(['*', '_']))
}
