//! Print caption text: the threshold-filter sentence and word wrapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caption lines are wrapped at this many characters
pub const CAPTION_LINE_WIDTH: usize = 180;

/// One active threshold filter, e.g. `NT rPM >= 10`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFilter {
    /// Display name of the metric
    pub metric: String,
    pub operator: String,
    pub value: String,
}

impl fmt::Display for ThresholdFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.metric, self.operator, self.value)
    }
}

/// Greedy word wrap. Words longer than `max_chars` get a line of their own.
pub fn wrap_caption(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Caption lines describing the active threshold filters; empty when none are set.
pub fn threshold_caption(filters: &[ThresholdFilter]) -> Vec<String> {
    if filters.is_empty() {
        return Vec::new();
    }
    let n = filters.len();
    let joined = filters.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
    let text = format!(
        "{} filter{} applied to the above heatmap: {}. Non-conforming cells have been hidden or grayed out.",
        n,
        if n > 1 { "s were" } else { " was" },
        joined
    );
    wrap_caption(&text, CAPTION_LINE_WIDTH)
}
