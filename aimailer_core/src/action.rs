use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Reply,
    Summarize,
    Improve,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Reply, ActionKind::Summarize, ActionKind::Improve];

    pub fn id(self) -> &'static str {
        match self {
            ActionKind::Reply => "reply",
            ActionKind::Summarize => "summarize",
            ActionKind::Improve => "improve",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Reply => "Generate Reply",
            ActionKind::Summarize => "Summarize Email",
            ActionKind::Improve => "Improve Draft",
        }
    }

    /// Status line shown while a request of this kind is in flight.
    pub fn progress_label(self) -> &'static str {
        match self {
            ActionKind::Reply => "Generating reply...",
            ActionKind::Summarize => "Summarizing email...",
            ActionKind::Improve => "Improving draft...",
        }
    }

    pub fn supports_tone(self) -> bool {
        matches!(self, ActionKind::Reply | ActionKind::Improve)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Persuasive,
    Informative,
    Apologetic,
    Thankful,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Professional,
        Tone::Friendly,
        Tone::Persuasive,
        Tone::Informative,
        Tone::Apologetic,
        Tone::Thankful,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Friendly => "friendly",
            Tone::Persuasive => "persuasive",
            Tone::Informative => "informative",
            Tone::Apologetic => "apologetic",
            Tone::Thankful => "thankful",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Friendly => "Friendly",
            Tone::Persuasive => "Persuasive",
            Tone::Informative => "Informative",
            Tone::Apologetic => "Apologetic",
            Tone::Thankful => "Thankful",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The user-authored subject/body pair an action works on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub subject: String,
    pub body: String,
}

impl Draft {
    pub fn new<S: Into<String>, B: Into<String>>(subject: S, body: B) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Actions are only enabled once the body has some non-whitespace text.
    pub fn is_actionable(&self) -> bool {
        !self.body.trim().is_empty()
    }

    /// The subject exactly as typed, or `None` when it is blank.
    pub fn subject(&self) -> Option<&str> {
        if self.subject.trim().is_empty() {
            None
        } else {
            Some(&self.subject)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_empty() && self.body.is_empty()
    }

    pub fn clear(&mut self) {
        self.subject.clear();
        self.body.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub tone: Option<Tone>,
    pub draft: Draft,
}

impl ActionRequest {
    pub fn new(kind: ActionKind, draft: Draft) -> Self {
        Self {
            kind,
            tone: None,
            draft,
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = Some(tone);
        self
    }

    /// Tone that actually shapes the prompt. Summaries never carry one.
    pub fn effective_tone(&self) -> Option<Tone> {
        if self.kind.supports_tone() {
            Some(self.tone.unwrap_or_default())
        } else {
            None
        }
    }
}

/// Per-action tone choice. Reply and Improve are tracked independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToneSelection {
    reply: Tone,
    improve: Tone,
}

impl ToneSelection {
    pub fn get(&self, kind: ActionKind) -> Option<Tone> {
        match kind {
            ActionKind::Reply => Some(self.reply),
            ActionKind::Improve => Some(self.improve),
            ActionKind::Summarize => None,
        }
    }

    /// Returns false when `kind` takes no tone.
    pub fn set(&mut self, kind: ActionKind, tone: Tone) -> bool {
        match kind {
            ActionKind::Reply => self.reply = tone,
            ActionKind::Improve => self.improve = tone,
            ActionKind::Summarize => return false,
        }
        true
    }
}
