//! A one-line text prompt.
//!
//! Run with: cargo run --example echo
//! Debug log: SPARK_PROMPT_LOG=spark_prompt=debug cargo run --example echo 2>prompt.log

use spark_prompt::logging::{init_logging, LogConfig};
use spark_prompt::text::{next_boundary, prev_boundary, string_width};
use spark_prompt::{Context, KeyCode, KeyEvent, Session, SessionOptions, Widget, WidgetResult};

/// Editable line with a grapheme-aware cursor.
struct TextInput {
    question: String,
    value: String,
    /// Byte offset of the cursor in `value`.
    cursor: usize,
}

impl TextInput {
    fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            value: String::new(),
            cursor: 0,
        }
    }

    fn frame(&self) -> String {
        let (before, after) = self.value.split_at(self.cursor);
        let hint = format!("{} cells", string_width(&self.value));
        format!(
            "\x1b[1m? {}\x1b[0m\n> {before}\x1b[7m \x1b[0m{after}\n\x1b[2m{hint}\x1b[0m",
            self.question
        )
    }
}

impl Widget for TextInput {
    type Output = String;

    fn render(&mut self, cx: &mut Context<'_, String>, _first: bool) -> WidgetResult {
        cx.render_frame(&self.frame())?;
        Ok(())
    }

    fn handle_input(&mut self, key: &KeyEvent, cx: &mut Context<'_, String>) -> WidgetResult {
        match key.code {
            KeyCode::Enter => {
                cx.render_frame(&format!("\x1b[32m✔\x1b[0m {} {}", self.question, self.value))?;
                cx.submit(self.value.clone());
                return Ok(());
            }
            KeyCode::Escape => {
                self.value.clear();
                self.cursor = 0;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                let start = prev_boundary(&self.value, self.cursor);
                self.value.replace_range(start..self.cursor, "");
                self.cursor = start;
            }
            KeyCode::Left => self.cursor = prev_boundary(&self.value, self.cursor),
            KeyCode::Right => self.cursor = next_boundary(&self.value, self.cursor),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.value.len(),
            _ => match key.char() {
                Some(c) if !c.is_control() => {
                    self.value.insert(self.cursor, c);
                    self.cursor += c.len_utf8();
                }
                _ => return Ok(()),
            },
        }
        self.render(cx, false)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = init_logging(&LogConfig::default()) {
        eprintln!("logging disabled: {err}");
    }

    let session = Session::new(TextInput::new("What is your name?"), SessionOptions::new());
    match session.run().await {
        Ok(name) => println!("Hello, {name}!"),
        Err(err) if err.is_cancelled() => std::process::exit(130),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
