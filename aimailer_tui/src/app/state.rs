use aimailer_core::{
    parse_structured_reply, ActionDispatcher, ActionKind, ActionRequest, Config, GenerationClient,
    GenerationError, Interaction, InteractionController, LlmClient, Tone,
};
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::app::clipboard::ClipboardService;
use crate::app::editor::{char_count, FieldEdit};
use crate::app::session_log::SessionLogger;
use crate::theme::Theme;

const COPY_NOTICE: Duration = Duration::from_secs(2);
const MAX_LOG_LINES: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusArea {
    Subject,
    Body,
    Buttons,
}

impl FocusArea {
    pub fn next(self) -> Self {
        match self {
            FocusArea::Subject => FocusArea::Body,
            FocusArea::Body => FocusArea::Buttons,
            FocusArea::Buttons => FocusArea::Subject,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FocusArea::Subject => FocusArea::Buttons,
            FocusArea::Body => FocusArea::Subject,
            FocusArea::Buttons => FocusArea::Body,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Subject,
    Body,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FooterAction {
    Action(ActionKind),
    SelectTone(Tone),
    ConfirmTone,
    CloseToneSelector,
    Copy,
    CopyBody,
    ClearAll,
    Quit,
}

#[derive(Clone, Debug)]
pub struct FooterButton {
    pub rect: Rect,
    pub action: FooterAction,
}

pub struct App {
    pub controller: InteractionController,
    pub dispatcher: ActionDispatcher,
    pub config: Config,
    pub theme: Theme,
    pub provider_name: String,
    pub subject_cursor: usize,
    pub body_cursor: usize,
    pub subject_scroll: u16,
    pub body_scroll: u16,
    pub focus: FocusArea,
    pub footer_buttons: Vec<FooterButton>,
    pub footer_focus: usize,
    pub subject_rect: Option<Rect>,
    pub body_rect: Option<Rect>,
    pub output_scroll: u16,
    pub output_max_scroll: u16,
    pub output_scrollbar_rect: Option<Rect>,
    pub dispatch_rx: Option<oneshot::Receiver<Result<String, GenerationError>>>,
    pub copied_at: Option<Instant>,
    pub clipboard: ClipboardService,
    pub logs: Vec<String>,
    pub tick_count: u64,
    pub dirty: bool,
    pub session_logger: SessionLogger,
}

impl App {
    pub fn new(config: Config) -> Self {
        let client = LlmClient::from_config(&config);
        let provider_name = client.provider_name().to_string();
        let client: Arc<dyn GenerationClient> = Arc::new(client);
        let dispatcher = ActionDispatcher::new(client, config.model());
        let theme = Theme::from_config(&config.theme);

        let mut app = Self::with_parts(
            config,
            theme,
            dispatcher,
            provider_name,
            SessionLogger::new(),
            ClipboardService::new(),
        );
        if !app.config.provider.has_key() {
            app.push_log(format!(
                "No API key configured for {}. Set AIMAILER_API_KEY or edit the config file.",
                app.provider_name
            ));
        }
        app
    }

    pub fn with_parts(
        config: Config,
        theme: Theme,
        dispatcher: ActionDispatcher,
        provider_name: String,
        session_logger: SessionLogger,
        clipboard: ClipboardService,
    ) -> Self {
        let mut app = Self {
            controller: InteractionController::new(),
            dispatcher,
            config,
            theme,
            provider_name,
            subject_cursor: 0,
            body_cursor: 0,
            subject_scroll: 0,
            body_scroll: 0,
            focus: FocusArea::Body,
            footer_buttons: Vec::new(),
            footer_focus: 0,
            subject_rect: None,
            body_rect: None,
            output_scroll: 0,
            output_max_scroll: 0,
            output_scrollbar_rect: None,
            dispatch_rx: None,
            copied_at: None,
            clipboard,
            logs: Vec::new(),
            tick_count: 0,
            dirty: true,
            session_logger,
        };
        app.push_log("AIMailer ready. Write or paste an email to get started.");
        if let Some(path) = app.session_logger.display_path() {
            app.push_log(format!("Session log file: {}", path));
        }
        app
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    /// Applies `edit` to a draft field. Returns false while a request is in
    /// flight, since the draft is locked then.
    pub fn edit_field(&mut self, field: Field, edit: impl FnOnce(&mut FieldEdit)) -> bool {
        let Some(draft) = self.controller.draft_mut() else {
            return false;
        };
        let mut editor = match field {
            Field::Subject => FieldEdit::new(&mut draft.subject, &mut self.subject_cursor, false),
            Field::Body => FieldEdit::new(&mut draft.body, &mut self.body_cursor, true),
        };
        edit(&mut editor);
        self.dirty = true;
        true
    }

    pub fn focused_field(&self) -> Option<Field> {
        match self.focus {
            FocusArea::Subject => Some(Field::Subject),
            FocusArea::Body => Some(Field::Body),
            FocusArea::Buttons => None,
        }
    }

    /// Button or shortcut for an action kind.
    pub fn press_action(&mut self, kind: ActionKind) {
        if !self.controller.draft().is_actionable() {
            tracing::debug!(action = %kind, "ignoring action on an empty body");
        }
        if let Some(request) = self.controller.press(kind) {
            self.spawn_dispatch(request);
        } else if let Some(expanded) = self.controller.expanded_selector() {
            self.focus = FocusArea::Buttons;
            self.footer_focus = self
                .controller
                .tone_for(expanded)
                .and_then(|tone| Tone::ALL.iter().position(|t| *t == tone))
                .unwrap_or(0);
        }
        self.dirty = true;
    }

    pub fn select_tone(&mut self, tone: Tone) {
        if let Some(kind) = self.controller.expanded_selector() {
            self.controller.select_tone(kind, tone);
            self.dirty = true;
        }
    }

    pub fn confirm_tone(&mut self) {
        let Some(kind) = self.controller.expanded_selector() else {
            return;
        };
        if let Some(request) = self.controller.confirm(kind) {
            self.spawn_dispatch(request);
        }
        self.dirty = true;
    }

    fn spawn_dispatch(&mut self, request: ActionRequest) {
        let tone = request
            .effective_tone()
            .map(|t| t.id())
            .unwrap_or("none");
        self.push_log(format!(
            "{} ({} chars)...",
            request.kind.label(),
            char_count(&request.draft.body)
        ));
        self.log_block(
            "ACTION_REQUEST",
            &format!(
                "action={}\ntone={}\nmodel={}\nsubject={}\nbody_chars={}",
                request.kind,
                tone,
                self.dispatcher.model(),
                request.draft.subject().unwrap_or(""),
                char_count(&request.draft.body)
            ),
        );

        let dispatcher = self.dispatcher.clone();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = dispatcher.execute(&request).await;
            let _ = tx.send(result);
        });

        self.dispatch_rx = Some(rx);
        self.copied_at = None;
        self.output_scroll = 0;
        self.footer_focus = 0;
    }

    /// Applies a finished dispatch, if any. Called once per tick.
    pub fn poll_dispatch(&mut self) {
        let Some(rx) = &mut self.dispatch_rx else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => {
                Err(GenerationError::new("request task ended unexpectedly"))
            }
        };
        self.dispatch_rx = None;

        match &outcome {
            Ok(text) => {
                self.push_log(format!("Response received ({} chars).", char_count(text)));
                self.log_block("RESPONSE", text);
            }
            Err(err) => {
                self.push_log(format!("Request failed: {}", err));
                self.log_block("REQUEST_ERROR", &err.message);
            }
        }
        self.controller.finish(outcome);
        self.output_scroll = 0;
        self.dirty = true;
    }

    pub fn clear_all(&mut self) {
        if self.is_loading() {
            self.push_log("Cannot clear while a request is running.");
            self.dirty = true;
            return;
        }
        self.controller.clear_all();
        self.subject_cursor = 0;
        self.body_cursor = 0;
        self.subject_scroll = 0;
        self.body_scroll = 0;
        self.output_scroll = 0;
        self.copied_at = None;
        self.focus = FocusArea::Body;
        self.footer_focus = 0;
        self.push_log("Draft cleared.");
        self.dirty = true;
    }

    pub fn copy_response(&mut self, body_only: bool) {
        let response = self.controller.response();
        if response.is_empty() {
            return;
        }
        let text = if body_only {
            match parse_structured_reply(response) {
                Some(parsed) => parsed.body,
                None => response.to_string(),
            }
        } else {
            response.to_string()
        };

        if self.clipboard.copy(&text) {
            self.copied_at = Some(Instant::now());
            self.push_log(format!("Copied {} chars to clipboard.", char_count(&text)));
        }
        self.dirty = true;
    }

    pub fn copy_notice_visible(&self) -> bool {
        self.copied_at
            .map(|at| at.elapsed() < COPY_NOTICE)
            .unwrap_or(false)
    }

    /// Expires the "Copied!" notice. Returns true when the screen changed.
    pub fn tick_copy_notice(&mut self) -> bool {
        if self.copied_at.is_some() && !self.copy_notice_visible() {
            self.copied_at = None;
            return true;
        }
        false
    }

    pub fn push_log<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        self.session_logger.event("LOG", &message);
        self.logs.push(message);
        if self.logs.len() > MAX_LOG_LINES {
            let overflow = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(0..overflow);
        }
    }

    pub fn log_block(&self, label: &str, body: &str) {
        self.session_logger.block(label, body);
    }

    pub fn phase_name(&self) -> &'static str {
        match self.controller.interaction() {
            Interaction::Idle => "IDLE",
            Interaction::Loading { .. } => "LOADING",
            Interaction::Responded { .. } => "RESPONDED",
            Interaction::Failed { .. } => "FAILED",
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    pub struct ScriptedClient {
        pub prompts: Mutex<Vec<String>>,
        reply: Result<String, GenerationError>,
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(&self, _model: &str, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    pub fn app_with(reply: Result<&str, &str>) -> (App, Arc<ScriptedClient>) {
        let client = Arc::new(ScriptedClient {
            prompts: Mutex::new(Vec::new()),
            reply: reply.map(str::to_string).map_err(GenerationError::new),
        });
        let dispatcher = ActionDispatcher::new(client.clone(), "test-model");
        let app = App::with_parts(
            Config::default(),
            Theme::dark(),
            dispatcher,
            "TEST".to_string(),
            SessionLogger::disabled(),
            ClipboardService::in_memory(),
        );
        (app, client)
    }

    pub fn type_body(app: &mut App, text: &str) {
        app.edit_field(Field::Body, |edit| edit.insert_str(text));
    }

    pub async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.poll_dispatch();
            if !app.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("dispatch never finished");
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{app_with, settle, type_body};
    use super::*;

    #[tokio::test]
    async fn summarize_runs_once_and_stores_response() {
        let (mut app, client) = app_with(Ok("A short summary."));
        type_body(&mut app, "Please review the attached budget.");

        app.press_action(ActionKind::Summarize);
        assert!(app.is_loading());
        assert!(!app.edit_field(Field::Body, |edit| edit.insert('x')));

        app.press_action(ActionKind::Summarize);
        settle(&mut app).await;

        assert_eq!(client.prompts.lock().unwrap().len(), 1);
        assert_eq!(app.controller.response(), "A short summary.");
        assert_eq!(app.phase_name(), "RESPONDED");
    }

    #[tokio::test]
    async fn reply_opens_selector_then_dispatches_with_chosen_tone() {
        let (mut app, client) = app_with(Ok("Subject: Re: Hi\nBody: Thanks!"));
        type_body(&mut app, "Hi there");

        app.press_action(ActionKind::Reply);
        assert_eq!(app.controller.expanded_selector(), Some(ActionKind::Reply));
        assert_eq!(app.focus, FocusArea::Buttons);
        assert!(!app.is_loading());

        app.select_tone(Tone::Thankful);
        app.confirm_tone();
        settle(&mut app).await;

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("thankful tone"));
        assert_eq!(app.controller.expanded_selector(), None);
    }

    #[tokio::test]
    async fn failure_shows_fixed_message() {
        let (mut app, _client) = app_with(Err("network timeout"));
        type_body(&mut app, "Hello");
        app.press_action(ActionKind::Summarize);
        settle(&mut app).await;

        assert_eq!(
            app.controller.error_message(),
            Some("Failed to process request: network timeout. Please check your API key and try again.")
        );
        assert_eq!(app.phase_name(), "FAILED");
    }

    #[tokio::test]
    async fn empty_body_makes_no_call() {
        let (mut app, client) = app_with(Ok("unused"));
        let logs_before = app.logs.clone();
        app.press_action(ActionKind::Summarize);
        app.press_action(ActionKind::Reply);
        assert!(!app.is_loading());
        assert!(app.dispatch_rx.is_none());
        assert!(client.prompts.lock().unwrap().is_empty());
        assert_eq!(app.logs, logs_before);
        assert_eq!(app.controller.expanded_selector(), None);
    }

    #[tokio::test]
    async fn copy_body_uses_structured_parse_and_sets_notice() {
        let (mut app, _client) = app_with(Ok("Subject: Re: Hi\nBody: Thanks for the update."));
        type_body(&mut app, "Hi");
        app.press_action(ActionKind::Summarize);
        settle(&mut app).await;

        app.copy_response(true);
        assert_eq!(app.clipboard.last_copied(), Some("Thanks for the update."));
        assert!(app.copy_notice_visible());

        app.copy_response(false);
        assert_eq!(
            app.clipboard.last_copied(),
            Some("Subject: Re: Hi\nBody: Thanks for the update.")
        );
    }

    #[tokio::test]
    async fn failed_copy_leaves_no_notice_or_log() {
        let (mut app, _client) = app_with(Ok("Summary."));
        type_body(&mut app, "Hi");
        app.press_action(ActionKind::Summarize);
        settle(&mut app).await;

        app.clipboard = ClipboardService::unavailable();
        let logs_before = app.logs.clone();
        app.copy_response(false);
        assert!(!app.copy_notice_visible());
        assert_eq!(app.logs, logs_before);
    }

    #[tokio::test]
    async fn clear_all_is_refused_while_loading() {
        let (mut app, _client) = app_with(Ok("done"));
        type_body(&mut app, "Hello");
        app.press_action(ActionKind::Summarize);
        app.clear_all();
        assert_eq!(app.controller.draft().body, "Hello");

        settle(&mut app).await;
        app.clear_all();
        assert!(app.controller.draft().is_empty());
        assert_eq!(app.controller.response(), "");
        assert_eq!(app.body_cursor, 0);
    }

    #[test]
    fn focus_cycles_through_fields_and_buttons() {
        assert_eq!(FocusArea::Subject.next(), FocusArea::Body);
        assert_eq!(FocusArea::Body.next(), FocusArea::Buttons);
        assert_eq!(FocusArea::Buttons.next(), FocusArea::Subject);
        assert_eq!(FocusArea::Subject.previous(), FocusArea::Buttons);
    }

    #[test]
    fn expired_copy_notice_is_cleared() {
        let (mut app, _client) = app_with(Ok(""));
        app.copied_at = Instant::now().checked_sub(Duration::from_secs(3));
        assert!(!app.copy_notice_visible());
        assert!(app.tick_copy_notice());
        assert!(app.copied_at.is_none());
    }
}
