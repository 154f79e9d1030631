/*!
# Scales and color mapping

Numeric scales map data values onto a normalized range. The same scale kind
drives both the clustering input (domain → `[0, 1]`) and the color mapping
(domain → `[0, palette.len() - 1]`).
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{Cell, Limits};

/// Scale transform applied before interpolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScaleKind {
    #[default]
    Linear,
    Symlog,
}

impl FromStr for ScaleKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "symlog" => ScaleKind::Symlog,
            "linear" => ScaleKind::Linear,
            other => {
                log::warn!("Unknown scale kind {:?}, falling back to linear", other);
                ScaleKind::Linear
            }
        })
    }
}

impl From<String> for ScaleKind {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<ScaleKind> for String {
    fn from(kind: ScaleKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleKind::Linear => write!(f, "linear"),
            ScaleKind::Symlog => write!(f, "symlog"),
        }
    }
}

impl ScaleKind {
    fn transform(self, value: f64) -> f64 {
        match self {
            ScaleKind::Linear => value,
            // Symmetric log with unit constant: defined at zero and for negatives.
            ScaleKind::Symlog => value.signum() * value.abs().ln_1p(),
        }
    }
}

/// Continuous, monotonic scale from a domain onto a range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    kind: ScaleKind,
    domain: (f64, f64),
    range: (f64, f64),
}

impl Scale {
    pub fn new(kind: ScaleKind, domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { kind, domain, range }
    }

    /// Scale over `limits` onto `[0, 1]`, used for clustering input
    pub fn normalized(kind: ScaleKind, limits: Limits) -> Self {
        Self::new(kind, (limits.min, limits.max), (0.0, 1.0))
    }

    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn apply(&self, value: f64) -> f64 {
        let lo = self.kind.transform(self.domain.0);
        let hi = self.kind.transform(self.domain.1);
        let span = hi - lo;
        // A collapsed domain maps everything onto the start of the range.
        let t = if span == 0.0 || !span.is_finite() {
            0.0
        } else {
            (self.kind.transform(value) - lo) / span
        };
        self.range.0 + t * (self.range.1 - self.range.0)
    }
}

/// Clamp `value` into `[min, max]`, scale it and round to the nearest integer.
///
/// The result always falls within the scale's range, even for values outside
/// the limits the scale was built from.
pub fn apply_scale(scale: &Scale, value: f64, min: f64, max: f64) -> i64 {
    let clamped = value.max(min).min(max);
    scale.apply(clamped).round() as i64
}

/// Caller hook that may replace the color chosen for a cell.
///
/// Arguments are the cell value, the cell, the palette color picked by the
/// scale, the whole palette and the no-value color.
pub trait ColorOverride {
    fn color(&self, value: f64, cell: &Cell, original: &str, palette: &[String], no_value: &str) -> String;
}

impl<F> ColorOverride for F
where
    F: Fn(f64, &Cell, &str, &[String], &str) -> String,
{
    fn color(&self, value: f64, cell: &Cell, original: &str, palette: &[String], no_value: &str) -> String {
        self(value, cell, original, palette, no_value)
    }
}

/// Two-stage value → palette color mapping
#[derive(Debug, Clone)]
pub struct ColorScale {
    scale: Scale,
    limits: Limits,
    palette: Vec<String>,
    no_value: String,
}

impl ColorScale {
    pub fn new(kind: ScaleKind, limits: Limits, palette: Vec<String>, no_value: String) -> Self {
        let top = palette.len().saturating_sub(1) as f64;
        Self {
            scale: Scale::new(kind, (limits.min, limits.max), (0.0, top)),
            limits,
            palette,
            no_value,
        }
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    pub fn no_value(&self) -> &str {
        &self.no_value
    }

    /// Palette index for a present value
    pub fn level(&self, value: f64) -> usize {
        let idx = apply_scale(&self.scale, value, self.limits.min, self.limits.max);
        (idx.max(0) as usize).min(self.palette.len().saturating_sub(1))
    }

    /// Final fill for a cell. Cells without a value always get the no-value color.
    pub fn color_for(&self, cell: &Cell, custom: Option<&dyn ColorOverride>) -> String {
        let Some(value) = cell.value else {
            return self.no_value.clone();
        };
        let original = match self.palette.get(self.level(value)) {
            Some(color) => color.as_str(),
            None => return self.no_value.clone(),
        };
        match custom {
            Some(hook) => hook.color(value, cell, original, &self.palette, &self.no_value),
            None => original.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limits(min: f64, max: f64) -> Limits {
        Limits { min, max }
    }

    #[test]
    fn test_unknown_scale_falls_back_to_linear() {
        assert_eq!("cubic".parse::<ScaleKind>().unwrap(), ScaleKind::Linear);
        assert_eq!("SymLog".parse::<ScaleKind>().unwrap(), ScaleKind::Symlog);
    }

    #[test]
    fn test_linear_scale_endpoints() {
        let s = Scale::normalized(ScaleKind::Linear, limits(0.0, 50.0));
        assert_eq!(s.apply(0.0), 0.0);
        assert_eq!(s.apply(25.0), 0.5);
        assert_eq!(s.apply(50.0), 1.0);
    }

    #[test]
    fn test_symlog_handles_zero_and_negative() {
        let s = Scale::normalized(ScaleKind::Symlog, limits(-10.0, 10.0));
        assert!((s.apply(0.0) - 0.5).abs() < 1e-12);
        assert!(s.apply(-10.0).abs() < 1e-12);
        assert!((s.apply(10.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_collapsed_domain_maps_to_range_start() {
        let s = Scale::normalized(ScaleKind::Linear, limits(0.0, 0.0));
        assert_eq!(s.apply(0.0), 0.0);
    }

    #[test]
    fn test_zero_and_null_get_different_colors() {
        let palette: Vec<String> = (0..10).map(|i| format!("#0000{:02x}", i)).collect();
        let cs = ColorScale::new(ScaleKind::Linear, limits(0.0, 9.0), palette.clone(), "#eaeaea".into());
        let zero = Cell { row_index: 0, column_index: 0, value: Some(0.0) };
        let null = Cell { row_index: 0, column_index: 1, value: None };
        assert_eq!(cs.color_for(&zero, None), palette[0]);
        assert_eq!(cs.color_for(&null, None), "#eaeaea");
    }

    #[test]
    fn test_override_receives_original_color() {
        let palette = vec!["#a".to_string(), "#b".to_string()];
        let cs = ColorScale::new(ScaleKind::Linear, limits(0.0, 1.0), palette, "#n".into());
        let gray_out = |value: f64, _: &Cell, original: &str, _: &[String], no_value: &str| {
            if value > 0.5 { original.to_string() } else { no_value.to_string() }
        };
        let low = Cell { row_index: 0, column_index: 0, value: Some(0.1) };
        let high = Cell { row_index: 0, column_index: 0, value: Some(0.9) };
        assert_eq!(cs.color_for(&low, Some(&gray_out)), "#n");
        assert_eq!(cs.color_for(&high, Some(&gray_out)), "#b");
    }

    proptest! {
        #[test]
        fn prop_scale_is_monotonic(a in -1e3f64..1e3, b in -1e3f64..1e3, symlog in any::<bool>()) {
            let kind = if symlog { ScaleKind::Symlog } else { ScaleKind::Linear };
            let s = Scale::normalized(kind, limits(-1e3, 1e3));
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(s.apply(lo) <= s.apply(hi));
        }

        #[test]
        fn prop_apply_scale_clamps(v in -1e6f64..1e6, symlog in any::<bool>()) {
            let kind = if symlog { ScaleKind::Symlog } else { ScaleKind::Linear };
            let s = Scale::new(kind, (0.0, 100.0), (0.0, 9.0));
            let out = apply_scale(&s, v, 0.0, 100.0);
            prop_assert!((0..=9).contains(&out));
            if v < 0.0 {
                prop_assert_eq!(out, apply_scale(&s, 0.0, 0.0, 100.0));
            }
            if v > 100.0 {
                prop_assert_eq!(out, apply_scale(&s, 100.0, 0.0, 100.0));
            }
        }
    }
}
