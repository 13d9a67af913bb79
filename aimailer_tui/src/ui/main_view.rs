use aimailer_core::{parse_structured_reply, subject_line_index, ActionKind, Interaction, Tone};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::app::editor::{
    cursor_line_col, split_line_at_char, text_stats, visual_row_of, visual_rows, VisualRow,
};
use crate::app::state::{App, FocusArea, FooterAction, FooterButton};
use crate::theme::Theme;

/// Columns drawn before each row of a draft field.
pub const FIELD_PREFIX_WIDTH: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ButtonLook {
    Normal,
    Disabled,
    Selected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ButtonSpec {
    action: FooterAction,
    label: String,
    look: ButtonLook,
}

impl ButtonSpec {
    fn new(action: FooterAction, label: impl Into<String>) -> Self {
        Self {
            action,
            label: label.into(),
            look: ButtonLook::Normal,
        }
    }

    fn look(mut self, look: ButtonLook) -> Self {
        self.look = look;
        self
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let very_narrow_width = area.width < 80;
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(main_layout_constraints(area))
        .split(area);

    // --- HEADER ---
    let header_text = if very_narrow_width {
        Line::from(vec![
            Span::styled(" AIMAILER ", app.theme.header_title_style),
            Span::styled(" // AI EMAIL ", app.theme.header_subtitle_style),
        ])
    } else {
        Line::from(vec![
            Span::styled(" A I M A I L E R ", app.theme.header_title_style),
            Span::styled(" // AI EMAIL ASSISTANT ", app.theme.header_subtitle_style),
        ])
    };
    let status = match app.controller.interaction() {
        Interaction::Loading { .. } => " STATUS: WORKING ",
        Interaction::Failed { .. } => " STATUS: ERROR ",
        _ => " STATUS: READY ",
    };
    let header = Paragraph::new(header_text).style(app.theme.base_style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.theme.border_style)
            .title(status),
    );
    f.render_widget(header, main_layout[0]);

    // --- DRAFT FIELDS ---
    render_subject(f, app, main_layout[1]);
    render_body(f, app, main_layout[2]);

    // --- BUTTONS ---
    render_button_bar(f, app, main_layout[3]);

    // --- OUTPUT ---
    render_output(f, app, main_layout[4]);

    // --- FOOTER ---
    render_footer(f, app, main_layout[5]);
}

fn main_layout_constraints(area: Rect) -> [Constraint; 6] {
    let short_height = area.height < 24;
    [
        Constraint::Length(3),
        Constraint::Length(3),
        if short_height {
            Constraint::Length(5)
        } else {
            Constraint::Percentage(35)
        },
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(2),
    ]
}

fn field_block<'a>(title: &'a str, focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if focused {
        theme.focused_border_style
    } else {
        theme.border_style
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title, theme.field_title_style))
}

fn render_subject(f: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == FocusArea::Subject;
    let block = field_block(" SUBJECT ", focused, &app.theme);
    let inner = block.inner(area);
    f.render_widget(block, area);
    app.subject_rect = Some(inner);

    let subject = app.controller.draft().subject.as_str();
    if subject.is_empty() && !focused {
        let hint = Paragraph::new(Span::styled(" (optional)", app.theme.placeholder_style));
        f.render_widget(hint, inner);
        return;
    }

    let rows = visual_rows(subject, inner.width.saturating_sub(FIELD_PREFIX_WIDTH) as usize);
    let cursor_row = visual_row_of(&rows, app.subject_cursor);
    app.subject_scroll = follow_cursor(app.subject_scroll, cursor_row, rows.len(), inner.height);
    let lines = render_field_rows(&rows, field_cursor(app, focused, app.subject_cursor), &app.theme);
    f.render_widget(
        Paragraph::new(lines).scroll((app.subject_scroll, 0)),
        inner,
    );
}

fn render_body(f: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == FocusArea::Body;
    let body = app.controller.draft().body.as_str();
    let mut block = field_block(" BODY ", focused, &app.theme);
    if !body.is_empty() {
        let stats = if focused {
            let (line, col) = cursor_line_col(body, app.body_cursor);
            format!(" Ln {}, Col {} | {} ", line + 1, col + 1, text_stats(body))
        } else {
            format!(" {} ", text_stats(body))
        };
        block = block.title_bottom(
            Line::from(Span::styled(stats, app.theme.header_subtitle_style)).right_aligned(),
        );
    }
    let inner = block.inner(area);
    f.render_widget(block, area);
    app.body_rect = Some(inner);

    if body.is_empty() && !focused {
        let hint = Paragraph::new(Span::styled(
            " Paste or type the email here...",
            app.theme.placeholder_style,
        ));
        f.render_widget(hint, inner);
        return;
    }

    let rows = visual_rows(body, inner.width.saturating_sub(FIELD_PREFIX_WIDTH) as usize);
    let cursor_row = visual_row_of(&rows, app.body_cursor);
    app.body_scroll = follow_cursor(app.body_scroll, cursor_row, rows.len(), inner.height);
    let lines = render_field_rows(&rows, field_cursor(app, focused, app.body_cursor), &app.theme);
    f.render_widget(Paragraph::new(lines).scroll((app.body_scroll, 0)), inner);
}

/// Cursor position to draw, or `None` when it should be hidden this frame.
fn field_cursor(app: &App, focused: bool, cursor: usize) -> Option<usize> {
    let blink_on = (app.tick_count / 4) % 2 == 0;
    (focused && !app.is_loading() && blink_on).then_some(cursor)
}

/// Keeps `cursor_row` inside a viewport of `height` rows.
fn follow_cursor(scroll: u16, cursor_row: usize, row_count: usize, height: u16) -> u16 {
    let height = height.max(1) as usize;
    let mut scroll = (scroll as usize).min(row_count.saturating_sub(height));
    if cursor_row < scroll {
        scroll = cursor_row;
    } else if cursor_row >= scroll + height {
        scroll = cursor_row + 1 - height;
    }
    scroll.min(u16::MAX as usize) as u16
}

fn render_field_rows<'a>(
    rows: &'a [VisualRow],
    cursor: Option<usize>,
    theme: &Theme,
) -> Vec<Line<'a>> {
    let prefix = " ".repeat(FIELD_PREFIX_WIDTH as usize);
    let cursor_row = cursor.map(|c| (visual_row_of(rows, c), c));

    rows.iter()
        .enumerate()
        .map(|(idx, row)| match cursor_row {
            Some((at, c)) if at == idx => {
                let (before, current, after) = split_line_at_char(&row.text, c.saturating_sub(row.start));
                let under = current.map(String::from).unwrap_or_else(|| " ".to_string());
                Line::from(vec![
                    Span::raw(prefix.clone()),
                    Span::styled(before, theme.input_text_style),
                    Span::styled(under, theme.input_cursor_style),
                    Span::styled(after, theme.input_text_style),
                ])
            }
            _ => Line::from(vec![
                Span::raw(prefix.clone()),
                Span::styled(row.text.as_str(), theme.input_text_style),
            ]),
        })
        .collect()
}

// --- BUTTONS ---

fn button_specs(app: &App) -> Vec<ButtonSpec> {
    let controller = &app.controller;
    if controller.is_loading() {
        return vec![ButtonSpec::new(FooterAction::Quit, "QUIT")];
    }

    if let Some(kind) = controller.expanded_selector() {
        let current = controller.tone_for(kind).unwrap_or_default();
        let mut specs: Vec<ButtonSpec> = Tone::ALL
            .iter()
            .map(|tone| {
                let look = if *tone == current {
                    ButtonLook::Selected
                } else {
                    ButtonLook::Normal
                };
                ButtonSpec::new(FooterAction::SelectTone(*tone), tone.label().to_uppercase())
                    .look(look)
            })
            .collect();
        specs.push(ButtonSpec::new(
            FooterAction::ConfirmTone,
            format!("GENERATE ({})", current.label()),
        ));
        specs.push(ButtonSpec::new(FooterAction::CloseToneSelector, "BACK"));
        return specs;
    }

    let action_look = if controller.draft().is_actionable() {
        ButtonLook::Normal
    } else {
        ButtonLook::Disabled
    };
    let mut specs = vec![
        ButtonSpec::new(FooterAction::Action(ActionKind::Reply), "REPLY").look(action_look),
        ButtonSpec::new(FooterAction::Action(ActionKind::Summarize), "SUMMARIZE").look(action_look),
        ButtonSpec::new(FooterAction::Action(ActionKind::Improve), "IMPROVE").look(action_look),
    ];
    let response = controller.response();
    if !response.is_empty() {
        specs.push(ButtonSpec::new(FooterAction::Copy, "COPY"));
        if parse_structured_reply(response).is_some() {
            specs.push(ButtonSpec::new(FooterAction::CopyBody, "COPY BODY"));
        }
    }
    specs.push(ButtonSpec::new(FooterAction::ClearAll, "CLEAR ALL"));
    specs.push(ButtonSpec::new(FooterAction::Quit, "QUIT"));
    specs
}

fn compact_button_label(action: FooterAction, label: &str) -> String {
    let short = match action {
        FooterAction::Action(ActionKind::Summarize) => "SUM",
        FooterAction::Action(ActionKind::Improve) => "IMPR",
        FooterAction::SelectTone(Tone::Professional) => "PRO",
        FooterAction::SelectTone(Tone::Persuasive) => "PERS",
        FooterAction::SelectTone(Tone::Informative) => "INFO",
        FooterAction::SelectTone(Tone::Apologetic) => "SORRY",
        FooterAction::SelectTone(Tone::Thankful) => "THX",
        FooterAction::ConfirmTone => "GO",
        FooterAction::CopyBody => "BODY",
        FooterAction::ClearAll => "CLR",
        _ => return label.chars().take(8).collect(),
    };
    short.to_string()
}

fn button_row_width(specs: &[ButtonSpec]) -> u16 {
    let tokens: u16 = specs
        .iter()
        .map(|spec| spec.label.chars().count() as u16 + 4)
        .sum();
    tokens + specs.len().saturating_sub(1) as u16
}

fn render_button_bar(f: &mut Frame, app: &mut App, area: Rect) {
    app.footer_buttons.clear();
    if area.height == 0 || area.width == 0 {
        return;
    }

    let mut specs = button_specs(app);
    if button_row_width(&specs) > area.width {
        for spec in specs.iter_mut() {
            spec.label = compact_button_label(spec.action, &spec.label);
        }
    }
    while !specs.is_empty() && button_row_width(&specs) > area.width {
        specs.pop();
    }
    if specs.is_empty() {
        if app.focus == FocusArea::Buttons {
            app.focus = FocusArea::Body;
        }
        return;
    }
    if app.footer_focus >= specs.len() {
        app.footer_focus = 0;
    }

    let constraints: Vec<Constraint> = specs
        .iter()
        .map(|spec| Constraint::Length(spec.label.chars().count() as u16 + 4))
        .collect();
    let button_rects = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .spacing(1)
        .split(area);

    for (i, (spec, rect)) in specs.iter().zip(button_rects.iter()).enumerate() {
        let style = if app.focus == FocusArea::Buttons && app.footer_focus == i {
            app.theme.footer_selected_style
        } else {
            match spec.look {
                ButtonLook::Normal => app.theme.footer_key_style,
                ButtonLook::Disabled => app.theme.footer_disabled_style,
                ButtonLook::Selected => app.theme.tone_selected_style,
            }
        };
        f.render_widget(
            Paragraph::new(format!(" [{}] ", spec.label)).style(style),
            *rect,
        );
        app.footer_buttons.push(FooterButton {
            rect: *rect,
            action: spec.action,
        });
    }
}

// --- OUTPUT ---

fn output_title(app: &App) -> String {
    match app.controller.interaction() {
        Interaction::Idle => " STATUS & LOGS ".to_string(),
        Interaction::Loading { action } => format!(" {} ", action.label().to_uppercase()),
        Interaction::Failed { .. } => " ERROR ".to_string(),
        Interaction::Responded { .. } if app.copy_notice_visible() => " RESPONSE | Copied! ".to_string(),
        Interaction::Responded { .. } => " RESPONSE ".to_string(),
    }
}

fn render_output(f: &mut Frame, app: &mut App, area: Rect) {
    let title = output_title(app);
    let title_style = if app.copy_notice_visible() {
        app.theme.success_style
    } else {
        app.theme.header_title_style
    };
    let output_block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style)
        .title(Span::styled(title, title_style));
    let inner = output_block.inner(area);
    f.render_widget(output_block, area);

    let (max_scroll, clamped_scroll, scrollbar_rect) = {
        let content = build_output_lines(app);
        let line_count = wrapped_line_count(&content, inner.width.saturating_sub(1));
        let max_scroll = line_count.saturating_sub(inner.height);
        let clamped_scroll = app.output_scroll.min(max_scroll);
        let show_scrollbar = max_scroll > 0 && inner.width > 1 && inner.height > 0;
        let scrollbar_rect = show_scrollbar.then(|| Rect {
            x: inner.x + inner.width - 1,
            y: inner.y,
            width: 1,
            height: inner.height,
        });

        let mut text_area = inner;
        if show_scrollbar {
            text_area.width = text_area.width.saturating_sub(1);
        }
        let para = Paragraph::new(content)
            .style(app.theme.base_style)
            .wrap(Wrap { trim: false })
            .scroll((clamped_scroll, 0));
        f.render_widget(para, text_area);

        if show_scrollbar {
            let mut state =
                ScrollbarState::new(line_count.max(1) as usize).position(clamped_scroll as usize);
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .thumb_style(app.theme.border_style)
                .track_style(app.theme.base_style);
            f.render_stateful_widget(scrollbar, inner, &mut state);
        }

        (max_scroll, clamped_scroll, scrollbar_rect)
    };

    app.output_max_scroll = max_scroll;
    app.output_scroll = clamped_scroll;
    app.output_scrollbar_rect = scrollbar_rect;
}

/// Rows the lines occupy once wrapped at `width`.
fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum::<usize>()
        .min(u16::MAX as usize) as u16
}

fn build_output_lines(app: &App) -> Vec<Line<'_>> {
    let theme = &app.theme;
    match app.controller.interaction() {
        Interaction::Idle => render_idle_view(app, theme),
        Interaction::Loading { action } => render_processing_view(app, *action, theme),
        Interaction::Failed { message } => render_error_view(message, theme),
        Interaction::Responded { text } => render_response_view(text, theme),
    }
}

fn render_idle_view<'a>(app: &'a App, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Write or paste an email above, then pick an action.",
            theme.header_subtitle_style,
        )),
        Line::from(Span::styled(
            "Ctrl+R Reply  Ctrl+S Summarize  Ctrl+I Improve  Ctrl+L Clear  Tab Focus  Esc Quit",
            theme.header_subtitle_style,
        )),
        Line::from(""),
    ];

    if !app.logs.is_empty() {
        lines.push(Line::from(Span::styled(
            "--- SESSION LOG ---",
            theme.header_subtitle_style,
        )));
        for log in app.logs.iter().rev().take(5) {
            lines.push(Line::from(Span::styled(
                format!(":: {}", log),
                theme.header_subtitle_style,
            )));
        }
    }
    lines
}

fn render_processing_view<'a>(app: &'a App, action: ActionKind, theme: &Theme) -> Vec<Line<'a>> {
    let spinner = ["|", "/", "-", "\\"];
    let frame = spinner[(app.tick_count as usize / 2) % spinner.len()];

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!(" {} ", frame), theme.processing_spinner_style),
            Span::styled(action.progress_label(), theme.processing_text_style),
        ]),
        Line::from(""),
    ];
    let tone = app
        .controller
        .tone_for(action)
        .map(|t| format!(" in a {} tone", t.id()))
        .unwrap_or_default();
    lines.push(Line::from(Span::styled(
        format!(
            "Asking {} ({}){}.",
            app.provider_name,
            app.dispatcher.model(),
            tone
        ),
        theme.header_subtitle_style,
    )));
    lines
}

fn render_error_view<'a>(message: &'a str, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(
            "REQUEST FAILED",
            theme.error_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for line in message.lines() {
        lines.push(Line::from(Span::styled(line, theme.error_style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Edit the draft or press an action again to retry.",
        theme.header_subtitle_style,
    )));
    lines
}

fn render_response_view<'a>(text: &'a str, theme: &Theme) -> Vec<Line<'a>> {
    let subject_idx = subject_line_index(text);
    let mut lines: Vec<Line> = text
        .lines()
        .enumerate()
        .map(|(idx, line)| {
            let style = if Some(idx) == subject_idx {
                theme.response_subject_style
            } else {
                theme.response_text_style
            };
            Line::from(Span::styled(line, style))
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(text_stats(text), theme.header_subtitle_style),
        Span::styled("   Ctrl+Y Copy", theme.header_subtitle_style),
    ]));
    lines
}

// --- FOOTER ---

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let footer_block = Block::default()
        .borders(Borders::TOP)
        .border_style(app.theme.border_style);
    let inner = footer_block.inner(area);
    f.render_widget(footer_block, area);

    let mut spans = vec![
        Span::styled(" MODE: ", app.theme.footer_text_style),
        Span::styled(app.phase_name(), app.theme.footer_highlight_style),
        Span::styled("  MODEL: ", app.theme.footer_text_style),
        Span::styled(app.dispatcher.model(), app.theme.footer_highlight_style),
    ];
    if area.width >= 100 {
        spans.push(Span::styled("  PROVIDER: ", app.theme.footer_text_style));
        spans.push(Span::styled(
            app.provider_name.as_str(),
            app.theme.footer_highlight_style,
        ));
    }
    let info = Paragraph::new(Line::from(spans)).style(app.theme.base_style);
    f.render_widget(info, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::testing::{app_with, settle, type_body};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn labels(app: &App) -> Vec<String> {
        button_specs(app).into_iter().map(|spec| spec.label).collect()
    }

    #[test]
    fn idle_buttons_are_disabled_without_body() {
        let (mut app, _client) = app_with(Ok(""));
        let specs = button_specs(&app);
        assert_eq!(specs[0].look, ButtonLook::Disabled);
        assert_eq!(
            labels(&app),
            vec!["REPLY", "SUMMARIZE", "IMPROVE", "CLEAR ALL", "QUIT"]
        );

        type_body(&mut app, "Hi");
        assert_eq!(button_specs(&app)[0].look, ButtonLook::Normal);
    }

    #[tokio::test]
    async fn tone_selector_marks_current_tone() {
        let (mut app, _client) = app_with(Ok(""));
        type_body(&mut app, "Hi");
        app.press_action(ActionKind::Improve);
        app.select_tone(Tone::Friendly);

        let specs = button_specs(&app);
        assert_eq!(specs.len(), Tone::ALL.len() + 2);
        assert_eq!(specs[1].look, ButtonLook::Selected);
        assert_eq!(specs[0].look, ButtonLook::Normal);
        assert_eq!(specs[6].label, "GENERATE (Friendly)");
        assert_eq!(specs[7].action, FooterAction::CloseToneSelector);
    }

    #[tokio::test]
    async fn copy_buttons_follow_the_response_shape() {
        let (mut app, _client) = app_with(Ok("Subject: Hi\nBody: Hello there"));
        type_body(&mut app, "Hi");
        app.press_action(ActionKind::Summarize);
        assert_eq!(labels(&app), vec!["QUIT"]);
        settle(&mut app).await;
        assert!(labels(&app).contains(&"COPY BODY".to_string()));

        let (mut app, _client) = app_with(Ok("Plain summary."));
        type_body(&mut app, "Hi");
        app.press_action(ActionKind::Summarize);
        settle(&mut app).await;
        let labels = labels(&app);
        assert!(labels.contains(&"COPY".to_string()));
        assert!(!labels.contains(&"COPY BODY".to_string()));
    }

    #[test]
    fn narrow_rows_use_compact_labels() {
        let (mut app, _client) = app_with(Ok(""));
        let screen = render(&mut app, 50, 30);
        assert!(screen.contains("[SUM]"));
        assert!(screen.contains("[CLR]"));
        assert_eq!(app.footer_buttons.len(), 5);
    }

    #[tokio::test]
    async fn response_and_stats_are_drawn() {
        let (mut app, _client) = app_with(Ok("Subject: Re: Budget\nBody: Numbers attached."));
        type_body(&mut app, "Please send the budget.");
        app.press_action(ActionKind::Summarize);
        settle(&mut app).await;

        let screen = render(&mut app, 120, 40);
        assert!(screen.contains("Subject: Re: Budget"));
        assert!(screen.contains("Body: Numbers attached."));
        assert!(screen.contains("Numbers attached."));
        assert!(screen.contains("23 chars | ~1 minute read"));
        assert!(screen.contains("MODE: RESPONDED"));
        assert!(screen.contains("PROVIDER: TEST"));
    }

    #[tokio::test]
    async fn response_lines_around_the_markers_stay_visible() {
        let text = "Sure, here is a reply you can send.\nSubject: Re: Hi\nBody: Thanks!";
        let (mut app, _client) = app_with(Ok(text));
        type_body(&mut app, "Hi");
        app.press_action(ActionKind::Summarize);
        settle(&mut app).await;

        let screen = render(&mut app, 120, 40);
        assert!(screen.contains("Sure, here is a reply you can send."));
        assert!(screen.contains("Subject: Re: Hi"));
        assert!(screen.contains("Body: Thanks!"));

        let lines = render_response_view(text, &app.theme);
        assert_eq!(lines[1].spans[0].style, app.theme.response_subject_style);
        assert_eq!(lines[0].spans[0].style, app.theme.response_text_style);
    }

    #[test]
    fn follow_cursor_scrolls_both_ways() {
        assert_eq!(follow_cursor(0, 7, 10, 3), 5);
        assert_eq!(follow_cursor(5, 2, 10, 3), 2);
        assert_eq!(follow_cursor(9, 0, 2, 3), 0);
    }
}
