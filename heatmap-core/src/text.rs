//! Label width estimation

/// Measures rendered text width in pixels
pub trait TextMeasure {
    fn width(&self, text: &str, font_size_px: f64) -> f64;
}

/// Glyph-class approximation of a proportional sans-serif font.
///
/// Exact metrics would need the font file; label zones only need a stable,
/// slightly generous estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTextMeasure;

impl ApproxTextMeasure {
    fn glyph_em(c: char) -> f64 {
        match c {
            'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '|' | '!' | '\'' | 'I' => 0.28,
            'f' | 't' | 'r' | ' ' | '(' | ')' | '[' | ']' | '-' => 0.36,
            'm' | 'w' => 0.83,
            'M' | 'W' => 0.9,
            '0'..='9' => 0.56,
            c if c.is_ascii_uppercase() => 0.67,
            c if c.is_ascii() => 0.52,
            // CJK and other wide scripts
            _ => 1.0,
        }
    }
}

impl TextMeasure for ApproxTextMeasure {
    fn width(&self, text: &str, font_size_px: f64) -> f64 {
        text.chars().map(Self::glyph_em).sum::<f64>() * font_size_px
    }
}
