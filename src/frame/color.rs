//! Frame colors
//!
//! Colors are assigned by name, never by position, so the same function always
//! shows up in the same color across steps and levels. The lookup tables live
//! in a [`ColorTable`] that callers can replace (per theme or per level).

use crate::level::token::base_name;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 24-bit color, serialized as `"#rrggbb"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(text: &str) -> Result<Self, String> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("Invalid color '{}': expected #rrggbb", text));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| format!("Invalid color '{}': bad hex digit", text))
        };

        Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Fallback when a table has an empty palette
pub const FALLBACK_COLOR: Color = Color::rgb(205, 214, 244);

/// Six-entry cycling palette
pub const DEFAULT_PALETTE: [Color; 6] = [
    Color::rgb(137, 180, 250), // Blue
    Color::rgb(250, 179, 135), // Orange
    Color::rgb(166, 227, 161), // Green
    Color::rgb(243, 139, 168), // Red
    Color::rgb(249, 226, 175), // Yellow
    Color::rgb(148, 226, 213), // Teal
];

/// Name → color lookup with a palette for unknown names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorTable {
    /// Exact-name overrides, checked first
    pub known: FxHashMap<String, Color>,
    /// Palette indexed by argument (`factorial(n)`) or by name hash
    pub palette: Vec<Color>,
}

impl Default for ColorTable {
    fn default() -> Self {
        let mut known = FxHashMap::default();
        known.insert("<global>".to_string(), Color::rgb(108, 112, 134));
        known.insert("console.log".to_string(), Color::rgb(245, 194, 231));
        known.insert("setTimeout".to_string(), Color::rgb(250, 179, 135));
        known.insert("setInterval".to_string(), Color::rgb(250, 179, 135));
        known.insert("Promise".to_string(), Color::rgb(166, 227, 161));
        known.insert("queueMicrotask".to_string(), Color::rgb(166, 227, 161));

        ColorTable {
            known,
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl ColorTable {
    /// Deterministic color for a frame name
    pub fn color_for(&self, name: &str) -> Color {
        if let Some(color) = self.known.get(name) {
            return *color;
        }

        if self.palette.is_empty() {
            return FALLBACK_COLOR;
        }

        let index = match factorial_argument(name) {
            Some(n) => n.wrapping_sub(1).rem_euclid(self.palette.len() as i64) as usize,
            None => (name_hash(name).unsigned_abs() as usize) % self.palette.len(),
        };
        self.palette[index]
    }
}

/// `n` from `"factorial(n)"`
fn factorial_argument(name: &str) -> Option<i64> {
    if base_name(name) != "factorial" {
        return None;
    }
    let open = name.find('(')?;
    let close = name.rfind(')')?;
    if close <= open {
        return None;
    }
    name[open + 1..close].trim().parse().ok()
}

/// 31-multiplier rolling hash over code points, wrapping at 32 bits
fn name_hash(name: &str) -> i32 {
    name.chars()
        .fold(0i32, |hash, c| hash.wrapping_mul(31).wrapping_add(c as i32))
}
