use aimailer_core::redact_sensitive_text;
use chrono::Local;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const MAX_EVENT_BYTES: usize = 4096;
const MAX_BLOCK_BYTES: usize = 65536;

/// Per-run transcript of drafting activity. Every line is redacted before it
/// reaches disk; write failures are swallowed.
pub struct SessionLogger {
    path: Option<PathBuf>,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl SessionLogger {
    pub fn new() -> Self {
        match default_log_path() {
            Some(path) => Self::open(&path),
            None => Self::disabled(),
        }
    }

    pub fn open(path: &Path) -> Self {
        if let Some(parent) = path.parent() {
            let _ = create_dir_all(parent);
        }
        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
            .map(BufWriter::new);

        Self {
            path: writer.as_ref().map(|_| path.to_path_buf()),
            writer: Mutex::new(writer),
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            writer: Mutex::new(None),
        }
    }

    pub fn display_path(&self) -> Option<String> {
        self.path.as_ref().map(|p| p.display().to_string())
    }

    pub fn event(&self, label: &str, message: &str) {
        let message = truncate_with_notice(&redact_sensitive_text(message), MAX_EVENT_BYTES);
        self.write_lines(&[format!("[{}] {} {}", timestamp(), label, message)]);
    }

    pub fn block(&self, label: &str, body: &str) {
        let body = truncate_with_notice(&redact_sensitive_text(body), MAX_BLOCK_BYTES);
        let mut lines = vec![format!("[{}] {} BEGIN", timestamp(), label)];
        lines.extend(body.lines().map(str::to_string));
        lines.push(format!("[{}] {} END", timestamp(), label));
        self.write_lines(&lines);
    }

    fn write_lines(&self, lines: &[String]) {
        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        let Some(writer) = guard.as_mut() else {
            return;
        };
        for line in lines {
            if writeln!(writer, "{}", line).is_err() {
                return;
            }
        }
        let _ = writer.flush();
    }
}

fn default_log_path() -> Option<PathBuf> {
    let base = dirs::data_dir().or_else(|| std::env::current_dir().ok())?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    Some(
        base.join("aimailer")
            .join("logs")
            .join(format!("session-{}.log", stamp)),
    )
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

fn truncate_with_notice(input: &str, limit: usize) -> String {
    if input.len() <= limit {
        return input.to_string();
    }

    let budget = limit.saturating_sub(64);
    let mut end = 0;
    for (idx, ch) in input.char_indices() {
        if idx + ch.len_utf8() > budget {
            break;
        }
        end = idx + ch.len_utf8();
    }
    format!(
        "{}\n...[truncated {} bytes]",
        &input[..end],
        input.len() - end
    )
}
