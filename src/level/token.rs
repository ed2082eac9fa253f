//! Replay tokens
//!
//! A level's trace is a flat list of strings. Each string is classified once,
//! when the level is loaded, into a [`TokenKind`]. The replay engine only ever
//! matches on the kind, so every token has exactly one interpretation.
//!
//! # Vocabulary
//!
//! ```text
//! ""                      → Halt
//! "<name>-return"         → Return(<name>)
//! "console.log"           → ConsoleLog
//! "<global>" | "main"     → Global
//! "*Promise*"             → Async(Promise)          (microtask)
//! "*queueMicrotask*"      → Async(QueueMicrotask)   (microtask)
//! "*setTimeout*" ...      → Async(SetTimeout) ...   (macrotask)
//! anything else           → Call(<name>)
//! ```

use crate::frame::QueueClass;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name of the global execution context
pub const GLOBAL_NAME: &str = "<global>";

/// Raw spelling of the console call
pub const CONSOLE_LOG: &str = "console.log";

const RETURN_SUFFIX: &str = "-return";

/// Sources that schedule work outside the call stack.
///
/// The set is closed: adding a source means adding a variant, and
/// [`AsyncSource::queue_class`] will not compile until the new variant has a
/// destination queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AsyncSource {
    QueueMicrotask,
    Promise,
    SetTimeout,
    SetInterval,
    SetImmediate,
    RequestAnimationFrame,
}

impl AsyncSource {
    /// Detection order. Microtask sources come first so that a name mentioning
    /// both kinds (`"Promise in setTimeout"`) lands in the microtask queue.
    const DETECTION_ORDER: [AsyncSource; 6] = [
        AsyncSource::QueueMicrotask,
        AsyncSource::Promise,
        AsyncSource::SetTimeout,
        AsyncSource::SetInterval,
        AsyncSource::SetImmediate,
        AsyncSource::RequestAnimationFrame,
    ];

    /// The identifier searched for inside a raw token
    pub fn marker(self) -> &'static str {
        match self {
            AsyncSource::QueueMicrotask => "queueMicrotask",
            AsyncSource::Promise => "Promise",
            AsyncSource::SetTimeout => "setTimeout",
            AsyncSource::SetInterval => "setInterval",
            AsyncSource::SetImmediate => "setImmediate",
            AsyncSource::RequestAnimationFrame => "requestAnimationFrame",
        }
    }

    /// Queue that receives work scheduled by this source
    pub fn queue_class(self) -> QueueClass {
        match self {
            AsyncSource::QueueMicrotask | AsyncSource::Promise => QueueClass::Microtask,
            AsyncSource::SetTimeout
            | AsyncSource::SetInterval
            | AsyncSource::SetImmediate
            | AsyncSource::RequestAnimationFrame => QueueClass::Macrotask,
        }
    }

    /// Find the first async source mentioned in `name`
    pub fn detect(name: &str) -> Option<AsyncSource> {
        Self::DETECTION_ORDER
            .into_iter()
            .find(|source| name.contains(source.marker()))
    }
}

/// Classified meaning of a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Entry into the global context (`"<global>"` or `"main"`)
    Global,
    /// Synchronous function entry; the name may carry arguments (`factorial(3)`)
    Call(String),
    /// Function exit; holds the name before `-return`
    Return(String),
    /// Instantaneous `console.log` call
    ConsoleLog,
    /// Work handed to the microtask or macrotask queue
    Async(AsyncSource),
    /// Explicit end of the trace (empty string)
    Halt,
}

/// A single trace token: the authored spelling plus its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Token {
    raw: String,
    kind: TokenKind,
}

impl Token {
    /// Classify a raw token string
    pub fn parse(raw: &str) -> Self {
        let kind = if raw.is_empty() {
            TokenKind::Halt
        } else if let Some(base) = raw.strip_suffix(RETURN_SUFFIX) {
            TokenKind::Return(base.to_string())
        } else if raw == CONSOLE_LOG {
            TokenKind::ConsoleLog
        } else if raw == GLOBAL_NAME || raw == "main" {
            TokenKind::Global
        } else if let Some(source) = AsyncSource::detect(raw) {
            TokenKind::Async(source)
        } else {
            TokenKind::Call(raw.to_string())
        };

        Token {
            raw: raw.to_string(),
            kind,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, TokenKind::Return(_))
    }

    pub fn is_console_log(&self) -> bool {
        matches!(self.kind, TokenKind::ConsoleLog)
    }

    pub fn is_halt(&self) -> bool {
        matches!(self.kind, TokenKind::Halt)
    }

    /// Name a frame pushed for this token is displayed under.
    ///
    /// `"main"` is shown as `"<global>"`; every other token keeps its spelling.
    /// Returns `None` for returns and the halt sentinel, which never push.
    pub fn frame_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Global => Some(GLOBAL_NAME),
            TokenKind::Call(name) => Some(name),
            TokenKind::ConsoleLog | TokenKind::Async(_) => Some(&self.raw),
            TokenKind::Return(_) | TokenKind::Halt => None,
        }
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Token::parse(&raw)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Token::parse(raw)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.raw
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Strip an argument list: `"factorial(3)"` → `"factorial"`
pub fn base_name(name: &str) -> &str {
    match name.find('(') {
        Some(open) => &name[..open],
        None => name,
    }
}

/// Key used to pair a pushed frame with a later `-return` token.
///
/// Arguments are dropped and `main` is folded into `<global>`.
pub fn match_key(name: &str) -> &str {
    match base_name(name) {
        "main" => GLOBAL_NAME,
        base => base,
    }
}

/// Parse a whole trace
pub fn parse_tokens<S: AsRef<str>>(raw: &[S]) -> Vec<Token> {
    raw.iter().map(|s| Token::parse(s.as_ref())).collect()
}
