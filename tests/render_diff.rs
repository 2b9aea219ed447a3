//! Frame renderer checked against a virtual terminal screen.
//!
//! The screen understands exactly the sequences the renderer emits: CR, LF,
//! cursor up/down, column zero, erase line, erase to end of screen, SGR and
//! DEC private modes (ignored). Anything else fails the test.

use std::io::{self, Write};

use spark_prompt::renderer::FrameRenderer;

// =============================================================================
// VIRTUAL SCREEN
// =============================================================================

struct Screen {
    rows: Vec<Vec<char>>,
    row: usize,
    col: usize,
}

impl Screen {
    fn new(height: usize) -> Self {
        Self {
            rows: vec![Vec::new(); height],
            row: 0,
            col: 0,
        }
    }

    /// Screen with shell output above the prompt; the cursor starts below it.
    fn with_history(height: usize, history: &[&str]) -> Self {
        let mut screen = Self::new(height);
        for line in history {
            screen.apply(line.as_bytes());
            screen.apply(b"\r\n");
        }
        screen
    }

    fn apply(&mut self, bytes: &[u8]) {
        let text = std::str::from_utf8(bytes).expect("renderer output is utf8");
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' => self.col = 0,
                '\n' => self.line_feed(),
                '\x1b' => {
                    assert_eq!(chars.next(), Some('['), "only CSI sequences expected");
                    let mut params = String::new();
                    let final_byte = loop {
                        let c = chars.next().expect("unterminated CSI");
                        if ('\x40'..='\x7e').contains(&c) {
                            break c;
                        }
                        params.push(c);
                    };
                    self.csi(&params, final_byte);
                }
                c => {
                    let row = &mut self.rows[self.row];
                    if row.len() <= self.col {
                        row.resize(self.col + 1, ' ');
                    }
                    row[self.col] = c;
                    self.col += 1;
                }
            }
        }
    }

    fn line_feed(&mut self) {
        if self.row + 1 == self.rows.len() {
            self.rows.remove(0);
            self.rows.push(Vec::new());
        } else {
            self.row += 1;
        }
    }

    fn csi(&mut self, params: &str, final_byte: char) {
        if params.starts_with('?') {
            assert!(matches!(final_byte, 'h' | 'l'), "unexpected private mode");
            return;
        }
        let n = params.parse::<usize>().unwrap_or(1);
        match final_byte {
            'A' => self.row = self.row.saturating_sub(n),
            'B' => self.row = (self.row + n).min(self.rows.len() - 1),
            'G' => self.col = 0,
            'K' => {
                assert_eq!(params, "2");
                self.rows[self.row].clear();
            }
            'J' => {
                self.rows[self.row].truncate(self.col);
                for row in &mut self.rows[self.row + 1..] {
                    row.clear();
                }
            }
            'm' => {}
            other => panic!("unexpected CSI final {other:?}"),
        }
    }

    fn line(&self, row: usize) -> String {
        let s: String = self.rows[row].iter().collect();
        s.trim_end().to_string()
    }

    fn lines(&self) -> Vec<String> {
        (0..self.rows.len()).map(|r| self.line(r)).collect()
    }
}

fn render(r: &mut FrameRenderer, screen: &mut Screen, text: &str, columns: usize) -> usize {
    let mut out = Vec::new();
    let stats = r.render(text, columns, &mut out).expect("render");
    screen.apply(&out);
    stats.bytes
}

/// The prompt block starting at `top`, followed only by blank rows.
fn assert_block(screen: &Screen, top: usize, expected: &[&str]) {
    let lines = screen.lines();
    for (i, want) in expected.iter().enumerate() {
        assert_eq!(lines[top + i], *want, "row {}", top + i);
    }
    for (row, line) in lines.iter().enumerate().skip(top + expected.len()) {
        assert!(line.is_empty(), "row {row} should be blank, found {line:?}");
    }
    assert_eq!(screen.row, top + expected.len() - 1, "cursor rests on last row");
}

/// Sink whose terminal has gone away.
struct Disconnected;

impl Write for Disconnected {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[test]
fn identical_frame_emits_no_bytes() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::new(10);
    render(&mut r, &mut screen, "? Name\n> bob", 80);
    assert_eq!(render(&mut r, &mut screen, "? Name\n> bob", 80), 0);
    assert_block(&screen, 0, &["? Name", "> bob"]);
}

#[test]
fn shrink_erases_every_trailing_row() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::new(10);
    render(&mut r, &mut screen, "a\nb\nc\nd", 80);
    render(&mut r, &mut screen, "x", 80);
    assert_block(&screen, 0, &["x"]);
}

#[test]
fn shrink_keeps_unwritten_last_line() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::new(10);
    render(&mut r, &mut screen, "header\nkeep me\ngone\nalso gone", 80);
    // Both surviving lines are unchanged and never rewritten.
    render(&mut r, &mut screen, "header\nkeep me", 80);
    assert_block(&screen, 0, &["header", "keep me"]);
}

#[test]
fn shrink_to_single_unchanged_line() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::new(10);
    render(&mut r, &mut screen, "x\ny\nz", 80);
    render(&mut r, &mut screen, "x", 80);
    assert_block(&screen, 0, &["x"]);
}

#[test]
fn grow_appends_rows() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::new(10);
    render(&mut r, &mut screen, "a", 80);
    render(&mut r, &mut screen, "a\nb\nc", 80);
    assert_block(&screen, 0, &["a", "b", "c"]);
}

#[test]
fn history_above_prompt_is_untouched() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::with_history(12, &["$ cargo run", "building..."]);
    let frames = [
        "? Pick\n  one\n> two\n  three",
        "? Pick\n> one\n  two\n  three",
        "? Pick\n> one",
        "? Pick\n> one\n  two",
        "done",
    ];
    for frame in frames {
        render(&mut r, &mut screen, frame, 80);
        let expected: Vec<&str> = frame.lines().collect();
        assert_block(&screen, 2, &expected);
        assert_eq!(screen.line(0), "$ cargo run");
        assert_eq!(screen.line(1), "building...");
    }
}

#[test]
fn sequence_of_frames_always_matches_screen() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::new(16);
    let frames = [
        "1\n2\n3",
        "1\n2\n3\n4\n5",
        "1\nX\n3\n4\n5",
        "1\nX",
        "",
        "a\n\nc",
        "a\nb\nc\nd\ne\nf",
        "a\nb\nc\nd\ne\nf",
        "f\ne\nd",
        "f",
    ];
    for frame in frames {
        render(&mut r, &mut screen, frame, 80);
        let expected: Vec<&str> = frame.split('\n').collect();
        assert_block(&screen, 0, &expected);
    }
}

#[test]
fn width_change_redraws_with_new_truncation() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::new(10);
    render(&mut r, &mut screen, "\x1b[1mabcdefghij\x1b[0m\nshort", 20);
    assert_block(&screen, 0, &["abcdefghij", "short"]);

    let mut out = Vec::new();
    let stats = r
        .render("\x1b[1mabcdefghij\x1b[0m\nshort", 6, &mut out)
        .expect("render");
    screen.apply(&out);
    assert!(stats.full_redraw);
    assert_block(&screen, 0, &["abcde…", "short"]);
}

#[test]
fn clear_removes_block_and_finish_steps_below() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::with_history(10, &["$ prompt"]);
    render(&mut r, &mut screen, "a\nb\nc", 80);

    let mut out = Vec::new();
    r.clear(&mut out).expect("clear");
    screen.apply(&out);
    assert_eq!(screen.line(0), "$ prompt");
    assert!(screen.lines()[1..].iter().all(String::is_empty));
    assert_eq!(screen.row, 1);

    render(&mut r, &mut screen, "answer: 42", 80);
    let mut out = Vec::new();
    r.finish(&mut out).expect("finish");
    screen.apply(&out);
    assert_eq!(screen.line(1), "answer: 42");
    assert_eq!((screen.row, screen.col), (2, 0));
}

#[test]
fn failed_write_does_not_leak_into_next_frame() {
    let mut r = FrameRenderer::new();
    let mut screen = Screen::new(10);
    render(&mut r, &mut screen, "a\nb\nc", 80);

    assert!(r.render("a\nb\nX", 80, &mut Disconnected).is_err());
    assert_block(&screen, 0, &["a", "b", "c"]);

    render(&mut r, &mut screen, "a\nb\nY", 80);
    assert_block(&screen, 0, &["a", "b", "Y"]);

    render(&mut r, &mut screen, "a\nZ", 80);
    assert_block(&screen, 0, &["a", "Z"]);
}
