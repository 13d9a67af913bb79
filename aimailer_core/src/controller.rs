//! Interaction state for one drafting session.
//!
//! The controller owns the draft, the per-action tone choices, the expanded
//! tone selector and the request phase. It never performs I/O itself:
//! [`InteractionController::begin`] hands back the request to run and
//! [`InteractionController::finish`] takes the outcome, so a front end can
//! run the dispatcher on whatever task it likes. At most one request is in
//! flight because `begin` refuses to start while loading.

use crate::action::{ActionKind, ActionRequest, Draft, Tone, ToneSelection};
use crate::dispatcher::ActionDispatcher;
use crate::error::GenerationError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Interaction {
    #[default]
    Idle,
    Loading {
        action: ActionKind,
    },
    Responded {
        text: String,
    },
    Failed {
        message: String,
    },
}

impl Interaction {
    pub fn is_loading(&self) -> bool {
        matches!(self, Interaction::Loading { .. })
    }

    pub fn active_action(&self) -> Option<ActionKind> {
        match self {
            Interaction::Loading { action } => Some(*action),
            _ => None,
        }
    }

    /// Empty unless the last request succeeded.
    pub fn response(&self) -> &str {
        match self {
            Interaction::Responded { text } => text,
            _ => "",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Interaction::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// User-facing text for a failed request.
pub fn failure_message(err: &GenerationError) -> String {
    format!(
        "Failed to process request: {}. Please check your API key and try again.",
        err.message
    )
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    draft: Draft,
    tones: ToneSelection,
    expanded: Option<ActionKind>,
    interaction: Interaction,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Editable draft, or `None` while a request is in flight.
    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        if self.interaction.is_loading() {
            None
        } else {
            Some(&mut self.draft)
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn is_loading(&self) -> bool {
        self.interaction.is_loading()
    }

    pub fn active_action(&self) -> Option<ActionKind> {
        self.interaction.active_action()
    }

    pub fn response(&self) -> &str {
        self.interaction.response()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.interaction.error_message()
    }

    /// Whether an action would start right now.
    pub fn can_dispatch(&self) -> bool {
        !self.interaction.is_loading() && self.draft.is_actionable()
    }

    pub fn tone_for(&self, kind: ActionKind) -> Option<Tone> {
        self.tones.get(kind)
    }

    /// Records a tone for `kind`. Never dispatches.
    pub fn select_tone(&mut self, kind: ActionKind, tone: Tone) -> bool {
        self.tones.set(kind, tone)
    }

    pub fn expanded_selector(&self) -> Option<ActionKind> {
        self.expanded
    }

    pub fn collapse_selector(&mut self) {
        self.expanded = None;
    }

    /// Button press for `kind`.
    ///
    /// Tone-bearing actions open their selector on the first press and
    /// dispatch on a second press of the same action. Summarize dispatches
    /// straight away. Returns the request to run when one was started.
    pub fn press(&mut self, kind: ActionKind) -> Option<ActionRequest> {
        if !self.can_dispatch() {
            return None;
        }

        if kind.supports_tone() && self.expanded != Some(kind) {
            self.expanded = Some(kind);
            return None;
        }

        self.confirm(kind)
    }

    /// Dispatches `kind` with its currently selected tone, closing the selector.
    pub fn confirm(&mut self, kind: ActionKind) -> Option<ActionRequest> {
        let request = self.begin(kind)?;
        self.expanded = None;
        Some(request)
    }

    /// `Idle → Loading`. Clears any previous response or error.
    ///
    /// Returns `None` without touching state when the body is blank or a
    /// request is already running.
    pub fn begin(&mut self, kind: ActionKind) -> Option<ActionRequest> {
        if self.interaction.is_loading() {
            tracing::debug!(action = %kind, "ignoring action while a request is in flight");
            return None;
        }
        if !self.draft.is_actionable() {
            return None;
        }

        let mut request = ActionRequest::new(kind, self.draft.clone());
        if let Some(tone) = self.tones.get(kind) {
            request = request.with_tone(tone);
        }
        self.interaction = Interaction::Loading { action: kind };
        Some(request)
    }

    /// `Loading → Responded | Failed`. Returns false when nothing was loading.
    pub fn finish(&mut self, outcome: Result<String, GenerationError>) -> bool {
        if !self.interaction.is_loading() {
            tracing::warn!("dropping a generation result that arrived while idle");
            return false;
        }

        self.interaction = match outcome {
            Ok(text) => Interaction::Responded { text },
            Err(err) => Interaction::Failed {
                message: failure_message(&err),
            },
        };
        true
    }

    /// Empties subject, body, response and error.
    pub fn clear_all(&mut self) {
        self.draft.clear();
        self.expanded = None;
        self.interaction = Interaction::Idle;
    }

    /// Runs one action end to end: begin, dispatch, finish.
    /// Returns false when the action was a no-op.
    pub async fn submit(&mut self, dispatcher: &ActionDispatcher, kind: ActionKind) -> bool {
        let Some(request) = self.begin(kind) else {
            return false;
        };
        let outcome = dispatcher.execute(&request).await;
        self.finish(outcome)
    }
}
