mod app;
mod theme;
mod ui;

use aimailer_core::Config;
use anyhow::{anyhow, Result};
use crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::Terminal;
use std::env;
use std::io::stdout;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::runtime::run_app;
use crate::app::state::App;
use crate::theme::Theme;

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    theme: Option<String>,
    model: Option<String>,
    config_path: Option<PathBuf>,
    help: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("{} needs a value", flag))
        };
        match arg.as_str() {
            "-h" | "--help" | "help" => parsed.help = true,
            "--theme" => {
                let theme = value("--theme")?;
                if !Theme::NAMES.contains(&theme.as_str()) {
                    return Err(anyhow!(
                        "Unknown theme '{}' (expected one of: {})",
                        theme,
                        Theme::NAMES.join(", ")
                    ));
                }
                parsed.theme = Some(theme);
            }
            "--model" => parsed.model = Some(value("--model")?),
            "--config" => parsed.config_path = Some(PathBuf::from(value("--config")?)),
            other => return Err(anyhow!("Unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

fn print_usage() {
    eprintln!(
        r#"aimailer - AI email assistant for the terminal

Usage: aimailer [options]

Options:
    --theme <name>    Color theme: auto, dark, light, retro
    --model <id>      Model id to use instead of the configured one
    --config <path>   Read configuration from this file
    -h, --help        Show this help message

Environment:
    AIMAILER_API_KEY  API key for the configured provider
    AIMAILER_LOG      Log filter (falls back to RUST_LOG, default "info")

Configuration file: ~/.config/aimailer/config.toml
"#
    );
}

fn setup_logging() {
    use std::fs::{self, OpenOptions};

    let filter = EnvFilter::try_from_env("AIMAILER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file = dirs::data_dir()
        .map(|dir| dir.join("aimailer"))
        .and_then(|dir| fs::create_dir_all(&dir).ok().map(|_| dir.join("aimailer.log")))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    // Stderr would draw over the alternate screen, so no file means no logs.
    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    }
}

async fn load_config(args: &CliArgs) -> Result<Config> {
    let mut config = match &args.config_path {
        Some(path) => Config::load_at(path).await?,
        None => Config::load().await?,
    };
    if let Some(theme) = &args.theme {
        config.theme = theme.clone();
    }
    if let Some(model) = &args.model {
        config.generation.model = Some(model.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{}", err);
            print_usage();
            std::process::exit(2);
        }
    };
    if args.help {
        print_usage();
        return Ok(());
    }

    setup_logging();
    let config = load_config(&args).await?;
    tracing::info!(
        provider = %config.provider.display_name(),
        model = %config.model(),
        "starting aimailer"
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Lets Ctrl+I arrive as its own key instead of Tab where the terminal allows it.
    let mut keyboard_enhancement_enabled = false;
    if crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false) {
        let flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
            | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES;
        if execute!(stdout, PushKeyboardEnhancementFlags(flags)).is_ok() {
            keyboard_enhancement_enabled = true;
        }
    }

    let mouse_capture_enabled = execute!(stdout, EnableMouseCapture).is_ok();
    let bracketed_paste_enabled = execute!(stdout, EnableBracketedPaste).is_ok();
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);

    // Run app loop
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    if bracketed_paste_enabled {
        let _ = execute!(terminal.backend_mut(), DisableBracketedPaste);
    }
    if mouse_capture_enabled {
        let _ = execute!(terminal.backend_mut(), DisableMouseCapture);
    }
    if keyboard_enhancement_enabled {
        let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "aimailer exited with an error");
        println!("{:?}", err);
    }

    Ok(())
}
