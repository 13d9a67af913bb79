use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub base_style: Style,
    pub border_style: Style,
    pub focused_border_style: Style,
    // Header
    pub header_title_style: Style,
    pub header_subtitle_style: Style,
    // Draft fields
    pub field_title_style: Style,
    pub input_text_style: Style,
    pub input_cursor_style: Style,
    pub placeholder_style: Style,
    // Response
    pub response_subject_style: Style,
    pub response_text_style: Style,
    pub processing_spinner_style: Style,
    pub processing_text_style: Style,
    // Buttons and footer
    pub footer_text_style: Style,
    pub footer_highlight_style: Style,
    pub footer_key_style: Style,
    pub footer_selected_style: Style,
    pub footer_disabled_style: Style,
    pub tone_selected_style: Style,
    // Alerts
    pub error_style: Style,
    pub success_style: Style,
}

/// The handful of colors a theme is built from.
struct Palette {
    /// Body text.
    text: Color,
    /// Typed input; brighter than `text` on dark backgrounds.
    input: Color,
    dim: Color,
    accent: Color,
    /// Text drawn on top of `accent`.
    on_accent: Color,
    /// Screen background, `None` keeps the terminal's own.
    background: Option<Color>,
    /// Chosen tone and copy confirmation.
    highlight: Color,
    error: Color,
}

impl Palette {
    fn into_theme(self) -> Theme {
        let bold = Modifier::BOLD;
        let mut base_style = Style::default().fg(self.text);
        if let Some(bg) = self.background {
            base_style = base_style.bg(bg);
        }
        let on_accent = Style::default().fg(self.on_accent).bg(self.accent);

        Theme {
            base_style,
            border_style: Style::default().fg(self.dim),
            focused_border_style: Style::default().fg(self.accent).add_modifier(bold),
            header_title_style: Style::default().fg(self.accent).add_modifier(bold),
            header_subtitle_style: Style::default().fg(self.dim),
            field_title_style: Style::default().fg(self.accent),
            input_text_style: Style::default().fg(self.input),
            input_cursor_style: on_accent,
            placeholder_style: Style::default().fg(self.dim).add_modifier(Modifier::ITALIC),
            response_subject_style: on_accent.add_modifier(bold),
            response_text_style: Style::default().fg(self.text),
            processing_spinner_style: Style::default().fg(self.accent).add_modifier(bold),
            processing_text_style: Style::default().fg(self.accent),
            footer_text_style: Style::default().fg(self.dim),
            footer_highlight_style: Style::default().fg(self.accent),
            footer_key_style: on_accent,
            footer_selected_style: Style::default()
                .fg(self.accent)
                .bg(self.on_accent)
                .add_modifier(bold | Modifier::REVERSED),
            footer_disabled_style: Style::default().fg(self.on_accent).bg(self.dim),
            tone_selected_style: Style::default()
                .fg(self.on_accent)
                .bg(self.highlight)
                .add_modifier(bold | Modifier::UNDERLINED),
            error_style: Style::default().fg(self.error),
            success_style: Style::default().fg(self.on_accent).bg(self.highlight),
        }
    }
}

impl Theme {
    /// Values accepted for `theme` in the config file and `--theme`.
    pub const NAMES: [&'static str; 4] = ["auto", "dark", "light", "retro"];

    /// Unknown names and `auto` follow the OS appearance.
    pub fn from_config(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "dark" => Self::dark(),
            "light" => Self::light(),
            "retro" => Self::retro(),
            _ => match dark_light::detect() {
                dark_light::Mode::Light => Self::light(),
                dark_light::Mode::Dark | dark_light::Mode::Default => Self::dark(),
            },
        }
    }

    /// Amber terminal look.
    pub fn retro() -> Self {
        let amber = Color::Rgb(255, 176, 0);
        Palette {
            text: amber,
            input: Color::White,
            dim: Color::Rgb(150, 110, 0),
            accent: amber,
            on_accent: Color::Black,
            background: None,
            highlight: Color::Rgb(255, 214, 102),
            error: Color::Rgb(255, 40, 40),
        }
        .into_theme()
    }

    pub fn light() -> Self {
        Palette {
            text: Color::Black,
            input: Color::Black,
            dim: Color::DarkGray,
            accent: Color::Blue,
            on_accent: Color::White,
            background: None,
            highlight: Color::Rgb(0, 120, 80),
            error: Color::Red,
        }
        .into_theme()
    }

    pub fn dark() -> Self {
        let bg = Color::Rgb(16, 18, 24);
        Palette {
            text: Color::Rgb(220, 220, 220),
            input: Color::White,
            dim: Color::Rgb(120, 120, 130),
            accent: Color::Rgb(90, 170, 255),
            on_accent: bg,
            background: Some(bg),
            highlight: Color::Rgb(120, 220, 160),
            error: Color::Rgb(255, 80, 80),
        }
        .into_theme()
    }
}
