//! Session configuration and terminal capabilities.
//!
//! Capabilities are inputs: the core never decides on its own whether the
//! terminal supports mouse reporting or true color, it only reads the values
//! it is given. [`Capabilities::detect`] is a convenience default for callers
//! that have no detection of their own.

use std::io::IsTerminal;
use std::time::Duration;

use crate::text::ELLIPSIS;

/// Environment override for the escape disambiguation timeout, in ms.
pub const ESC_TIMEOUT_ENV: &str = "SPARK_PROMPT_ESC_TIMEOUT_MS";

/// Default wait after a lone ESC before it is reported as the Escape key.
pub const DEFAULT_ESC_TIMEOUT: Duration = Duration::from_millis(20);

/// Input decoder tuning.
///
/// The escape timeout is a latency heuristic, not a protocol guarantee: over
/// slow links a real sequence can arrive split across the deadline and decode
/// as Escape followed by plain keys. Raise it when that happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub escape_timeout: Duration,
}

impl DecoderConfig {
    /// Defaults, with `SPARK_PROMPT_ESC_TIMEOUT_MS` applied when it parses.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = std::env::var(ESC_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.escape_timeout = Duration::from_millis(ms);
        }
        config
    }

    pub fn with_escape_timeout(mut self, timeout: Duration) -> Self {
        self.escape_timeout = timeout;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            escape_timeout: DEFAULT_ESC_TIMEOUT,
        }
    }
}

/// What the attached terminal can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Column count used to clamp rendered lines.
    pub columns: u16,
    pub true_color: bool,
    /// False under CI or when stdout is not a terminal.
    pub interactive: bool,
    pub mouse: bool,
}

impl Capabilities {
    /// Detect from the process environment.
    pub fn detect() -> Self {
        let columns = crossterm::terminal::size()
            .map(|(cols, _)| cols)
            .ok()
            .filter(|&cols| cols > 0)
            .unwrap_or(80);
        let env = |key: &str| std::env::var(key).ok();

        let ci = env("CI").is_some_and(|v| !v.is_empty() && v != "0" && v != "false");
        let dumb = env("TERM").is_some_and(|t| t == "dumb");
        let interactive = !ci && std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
        let true_color = env("COLORTERM").is_some_and(|v| v == "truecolor" || v == "24bit");
        let mouse = interactive && !dumb && env("NO_MOUSE").is_none();

        Self {
            columns,
            true_color,
            interactive,
            mouse,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            columns: 80,
            true_color: false,
            interactive: true,
            mouse: false,
        }
    }
}

/// Options for one prompt session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub decoder: DecoderConfig,
    /// `None` means detect at run time.
    pub capabilities: Option<Capabilities>,
    /// Marker appended to lines cut at the terminal width.
    pub ellipsis: String,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn ellipsis(mut self, ellipsis: impl Into<String>) -> Self {
        self.ellipsis = ellipsis.into();
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::from_env(),
            capabilities: None,
            ellipsis: ELLIPSIS.to_string(),
        }
    }
}
