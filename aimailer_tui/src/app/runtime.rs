use aimailer_core::ActionKind;
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::Stdout;
use std::time::Duration;

use crate::app::actions::{handle_escape, perform_footer_action};
use crate::app::editor::point_in_rect;
use crate::app::state::{App, Field, FocusArea, FooterAction};
use crate::ui::main_view::{ui, FIELD_PREFIX_WIDTH};

pub async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.tick_count += 1;
        app.poll_dispatch();
        if app.tick_copy_notice() {
            app.dirty = true;
        }

        if app.dirty || app.is_loading() {
            terminal.draw(|f| ui(f, app))?;
            app.dirty = false;
        }

        let poll_ms = if app.is_loading() { 50 } else { 200 };
        if event::poll(Duration::from_millis(poll_ms))? {
            app.dirty = true;
            if handle_runtime_event(app, event::read()?) {
                return Ok(());
            }
        }
    }
}

/// Returns true when the app should exit.
pub fn handle_runtime_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key_press(app, key),
        Event::Paste(text) => {
            handle_paste(app, &text);
            false
        }
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        _ => false,
    }
}

fn handle_key_press(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        let action = match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => Some(FooterAction::Quit),
            KeyCode::Char('r') => Some(FooterAction::Action(ActionKind::Reply)),
            KeyCode::Char('s') => Some(FooterAction::Action(ActionKind::Summarize)),
            KeyCode::Char('i') => Some(FooterAction::Action(ActionKind::Improve)),
            KeyCode::Char('y') => Some(FooterAction::Copy),
            KeyCode::Char('l') => Some(FooterAction::ClearAll),
            _ => None,
        };
        if let Some(action) = action {
            return perform_footer_action(app, action);
        }
    }

    match key.code {
        KeyCode::Esc => return handle_escape(app),
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return false;
        }
        KeyCode::BackTab => {
            app.focus = app.focus.previous();
            return false;
        }
        KeyCode::PageUp => {
            app.output_scroll = app.output_scroll.saturating_sub(10);
            return false;
        }
        KeyCode::PageDown => {
            app.output_scroll = app.output_scroll.saturating_add(10);
            return false;
        }
        _ => {}
    }

    match app.focused_field() {
        Some(field) => {
            handle_field_key(app, field, key);
            false
        }
        None => handle_button_key(app, key),
    }
}

fn handle_field_key(app: &mut App, field: Field, key: KeyEvent) {
    if field == Field::Subject && matches!(key.code, KeyCode::Enter | KeyCode::Down) {
        app.focus = FocusArea::Body;
        return;
    }

    app.edit_field(field, |edit| match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => edit.insert(c),
        KeyCode::Enter => edit.insert('\n'),
        KeyCode::Backspace => edit.backspace(),
        KeyCode::Delete => edit.delete(),
        KeyCode::Left => edit.left(),
        KeyCode::Right => edit.right(),
        KeyCode::Up => edit.up(),
        KeyCode::Down => edit.down(),
        KeyCode::Home => edit.line_start(),
        KeyCode::End => edit.line_end(),
        _ => {}
    });
}

fn handle_button_key(app: &mut App, key: KeyEvent) -> bool {
    let count = app.footer_buttons.len();
    match key.code {
        KeyCode::Left if count > 0 => {
            app.footer_focus = (app.footer_focus + count - 1) % count;
        }
        KeyCode::Right if count > 0 => {
            app.footer_focus = (app.footer_focus + 1) % count;
        }
        KeyCode::Up => app.output_scroll = app.output_scroll.saturating_sub(1),
        KeyCode::Down => app.output_scroll = app.output_scroll.saturating_add(1),
        KeyCode::Home => app.output_scroll = 0,
        KeyCode::End => app.output_scroll = app.output_max_scroll,
        KeyCode::Enter | KeyCode::Char(' ') => {
            if let Some(action) = app.footer_buttons.get(app.footer_focus).map(|b| b.action) {
                return perform_footer_action(app, action);
            }
        }
        _ => {}
    }
    false
}

fn handle_paste(app: &mut App, text: &str) {
    if let Some(field) = app.focused_field() {
        app.edit_field(field, |edit| edit.insert_str(text));
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> bool {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.output_scroll = app.output_scroll.saturating_sub(3);
        }
        MouseEventKind::ScrollDown => {
            app.output_scroll = app.output_scroll.saturating_add(3);
        }
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Down(MouseButton::Left) => {
            if let Some(sb) = app.output_scrollbar_rect {
                if app.output_max_scroll > 0 && point_in_rect(sb, mouse.column, mouse.row) {
                    let track_h = sb.height.max(1);
                    let rel = mouse.row.saturating_sub(sb.y).min(track_h - 1);
                    let denom = track_h.saturating_sub(1).max(1) as u32;
                    let new_scroll = (rel as u32 * app.output_max_scroll as u32 / denom) as u16;
                    app.output_scroll = new_scroll.min(app.output_max_scroll);
                    return false;
                }
            }

            if matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
                return handle_click(app, mouse.column, mouse.row);
            }
        }
        _ => {}
    }
    false
}

fn handle_click(app: &mut App, col: u16, row: u16) -> bool {
    let clicked = app
        .footer_buttons
        .iter()
        .enumerate()
        .find(|(_, btn)| point_in_rect(btn.rect, col, row))
        .map(|(idx, btn)| (idx, btn.action));
    if let Some((idx, action)) = clicked {
        app.focus = FocusArea::Buttons;
        app.footer_focus = idx;
        return perform_footer_action(app, action);
    }

    if let Some(area) = app.subject_rect.filter(|r| point_in_rect(*r, col, row)) {
        app.focus = FocusArea::Subject;
        let scroll = app.subject_scroll;
        app.edit_field(Field::Subject, |edit| {
            edit.click(area, col, row, FIELD_PREFIX_WIDTH, scroll)
        });
    } else if let Some(area) = app.body_rect.filter(|r| point_in_rect(*r, col, row)) {
        app.focus = FocusArea::Body;
        let scroll = app.body_scroll;
        app.edit_field(Field::Body, |edit| {
            edit.click(area, col, row, FIELD_PREFIX_WIDTH, scroll)
        });
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::testing::{app_with, settle};
    use crate::app::state::FooterButton;
    use crossterm::event::KeyEventState;
    use ratatui::layout::Rect;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_runtime_event(app, key(KeyCode::Char(c)));
        }
    }

    #[tokio::test]
    async fn typing_fills_subject_then_body() {
        let (mut app, _client) = app_with(Ok("unused"));
        handle_runtime_event(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.focus, FocusArea::Subject);
        type_text(&mut app, "Lunch");
        handle_runtime_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.focus, FocusArea::Body);
        type_text(&mut app, "Are you free?");
        handle_runtime_event(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "Sam");

        assert_eq!(app.controller.draft().subject, "Lunch");
        assert_eq!(app.controller.draft().body, "Are you free?\nSam");
    }

    #[tokio::test]
    async fn ctrl_s_summarizes_and_ctrl_l_clears() {
        let (mut app, client) = app_with(Ok("Summary."));
        handle_runtime_event(&mut app, Event::Paste("Long email body".to_string()));
        assert!(!handle_runtime_event(&mut app, ctrl('s')));
        settle(&mut app).await;
        assert_eq!(client.prompts.lock().unwrap().len(), 1);
        assert_eq!(app.controller.response(), "Summary.");

        handle_runtime_event(&mut app, ctrl('l'));
        assert!(app.controller.draft().is_empty());
        assert_eq!(app.controller.response(), "");
    }

    #[tokio::test]
    async fn keys_are_ignored_for_the_draft_while_loading() {
        let (mut app, _client) = app_with(Ok("done"));
        type_text(&mut app, "Hi");
        handle_runtime_event(&mut app, ctrl('s'));
        type_text(&mut app, "!!");
        assert_eq!(app.controller.draft().body, "Hi");
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn enter_on_focused_button_runs_it() {
        let (mut app, _client) = app_with(Ok("unused"));
        app.footer_buttons = vec![
            FooterButton {
                rect: Rect::new(0, 0, 5, 1),
                action: FooterAction::ClearAll,
            },
            FooterButton {
                rect: Rect::new(6, 0, 5, 1),
                action: FooterAction::Quit,
            },
        ];
        app.focus = FocusArea::Buttons;
        handle_runtime_event(&mut app, key(KeyCode::Left));
        assert_eq!(app.footer_focus, 1);
        assert!(handle_runtime_event(&mut app, key(KeyCode::Enter)));
    }

    #[tokio::test]
    async fn clicking_a_button_focuses_and_runs_it() {
        let (mut app, _client) = app_with(Ok("unused"));
        app.footer_buttons = vec![FooterButton {
            rect: Rect::new(10, 3, 8, 1),
            action: FooterAction::Quit,
        }];
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 12,
            row: 3,
            modifiers: KeyModifiers::NONE,
        });
        assert!(handle_runtime_event(&mut app, click));
        assert_eq!(app.focus, FocusArea::Buttons);
    }

    #[test]
    fn tab_cycles_focus() {
        let (mut app, _client) = app_with(Ok(""));
        assert_eq!(app.focus, FocusArea::Body);
        handle_runtime_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, FocusArea::Buttons);
        handle_runtime_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, FocusArea::Subject);
    }
}
