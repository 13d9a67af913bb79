use ratatui::layout::Rect;

/// Average silent reading speed used for the `~N minute read` hint.
const WORDS_PER_MINUTE: usize = 200;

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes needed to read `text`, rounded up. Zero for blank text.
pub fn reading_minutes(text: &str) -> usize {
    word_count(text).div_ceil(WORDS_PER_MINUTE)
}

pub fn text_stats(text: &str) -> String {
    let chars = char_count(text);
    let minutes = reading_minutes(text);
    if minutes == 0 {
        format!("{} chars", chars)
    } else {
        format!("{} chars | ~{} minute read", chars, minutes)
    }
}

pub fn split_line_at_char(line: &str, idx: usize) -> (String, Option<char>, String) {
    let before: String = line.chars().take(idx).collect();
    let mut rest = line.chars().skip(idx);
    let current = rest.next();
    (before, current, rest.collect())
}

pub fn point_in_rect(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x
        && col < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

/// One on-screen row of a field hard-wrapped at a fixed width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualRow {
    /// Char offset of the first char on this row.
    pub start: usize,
    pub text: String,
    /// Last row of its logical line.
    pub ends_line: bool,
}

pub fn visual_rows(text: &str, width: usize) -> Vec<VisualRow> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut offset = 0;
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(VisualRow {
                start: offset,
                text: String::new(),
                ends_line: true,
            });
        } else {
            let chunk_count = chars.len().div_ceil(width);
            for (i, chunk) in chars.chunks(width).enumerate() {
                rows.push(VisualRow {
                    start: offset + i * width,
                    text: chunk.iter().collect(),
                    ends_line: i + 1 == chunk_count,
                });
            }
        }
        offset += chars.len() + 1;
    }
    rows
}

/// Index of the row the cursor is drawn on.
pub fn visual_row_of(rows: &[VisualRow], cursor: usize) -> usize {
    rows.iter()
        .position(|row| {
            let end = row.start + char_count(&row.text);
            cursor >= row.start && (cursor < end || (row.ends_line && cursor == end))
        })
        .unwrap_or(rows.len().saturating_sub(1))
}

/// Logical line and column of a char cursor.
pub fn cursor_line_col(text: &str, cursor: usize) -> (usize, usize) {
    let lens = line_lengths(text);
    locate(&lens, cursor)
}

fn byte_index(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

fn line_lengths(text: &str) -> Vec<usize> {
    text.split('\n').map(char_count).collect()
}

fn locate(lens: &[usize], cursor: usize) -> (usize, usize) {
    let mut remaining = cursor;
    for (line, len) in lens.iter().enumerate() {
        if remaining <= *len {
            return (line, remaining);
        }
        remaining -= len + 1;
    }
    let last = lens.len().saturating_sub(1);
    (last, lens.get(last).copied().unwrap_or(0))
}

fn offset_of(lens: &[usize], line: usize, col: usize) -> usize {
    let start: usize = lens.iter().take(line).map(|len| len + 1).sum();
    start + col.min(lens.get(line).copied().unwrap_or(0))
}

/// Cursor-aware editing over one draft field.
///
/// Single-line fields turn pasted or typed newlines into spaces.
pub struct FieldEdit<'a> {
    text: &'a mut String,
    cursor: &'a mut usize,
    multiline: bool,
}

impl<'a> FieldEdit<'a> {
    pub fn new(text: &'a mut String, cursor: &'a mut usize, multiline: bool) -> Self {
        let len = char_count(text);
        if *cursor > len {
            *cursor = len;
        }
        Self {
            text,
            cursor,
            multiline,
        }
    }

    pub fn insert(&mut self, ch: char) {
        let ch = match ch {
            '\r' => return,
            '\n' if !self.multiline => ' ',
            other => other,
        };
        let idx = byte_index(self.text, *self.cursor);
        self.text.insert(idx, ch);
        *self.cursor += 1;
    }

    pub fn insert_str(&mut self, pasted: &str) {
        for ch in pasted.chars() {
            self.insert(ch);
        }
    }

    pub fn backspace(&mut self) {
        if *self.cursor == 0 {
            return;
        }
        let start = byte_index(self.text, *self.cursor - 1);
        let end = byte_index(self.text, *self.cursor);
        self.text.replace_range(start..end, "");
        *self.cursor -= 1;
    }

    pub fn delete(&mut self) {
        if *self.cursor >= char_count(self.text) {
            return;
        }
        let start = byte_index(self.text, *self.cursor);
        let end = byte_index(self.text, *self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    pub fn left(&mut self) {
        *self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if *self.cursor < char_count(self.text) {
            *self.cursor += 1;
        }
    }

    pub fn up(&mut self) {
        let lens = line_lengths(self.text);
        let (line, col) = locate(&lens, *self.cursor);
        *self.cursor = offset_of(&lens, line.saturating_sub(1), col);
    }

    pub fn down(&mut self) {
        let lens = line_lengths(self.text);
        let (line, col) = locate(&lens, *self.cursor);
        let target = (line + 1).min(lens.len().saturating_sub(1));
        *self.cursor = offset_of(&lens, target, col);
    }

    pub fn line_start(&mut self) {
        let lens = line_lengths(self.text);
        let (line, _) = locate(&lens, *self.cursor);
        *self.cursor = offset_of(&lens, line, 0);
    }

    pub fn line_end(&mut self) {
        let lens = line_lengths(self.text);
        let (line, _) = locate(&lens, *self.cursor);
        *self.cursor = offset_of(&lens, line, usize::MAX);
    }

    pub fn set_cursor(&mut self, pos: usize) {
        *self.cursor = pos.min(char_count(self.text));
    }

    /// Moves the cursor to a clicked cell. `area` is the text area inside the
    /// border, `prefix` the width drawn before each row, `scroll` the first
    /// visible row.
    pub fn click(&mut self, area: Rect, col: u16, row: u16, prefix: u16, scroll: u16) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let rows = visual_rows(self.text, area.width.saturating_sub(prefix) as usize);
        let idx = (row.saturating_sub(area.y) + scroll) as usize;
        let Some(target) = rows.get(idx).or(rows.last()) else {
            return;
        };
        let len = char_count(&target.text);
        let max_col = if target.ends_line {
            len
        } else {
            len.saturating_sub(1)
        };
        let col = col.saturating_sub(area.x).saturating_sub(prefix) as usize;
        self.set_cursor(target.start + col.min(max_col));
    }
}
