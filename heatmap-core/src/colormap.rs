//! Color palettes: the sequential data ramp and the categorical metadata pool

/// Yellow → orange → red ramp used when the caller supplies no palette
const YL_OR_RD: [&str; 9] = [
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026", "#800026",
];

/// Base colors for categorical metadata tracks
const CATEGORICAL: [&str; 12] = [
    "#3867fa", "#ff8c24", "#31b37a", "#e03b3b", "#8e5cd9", "#a6692f", "#e76fbe", "#7f7f7f",
    "#bcbd22", "#17becf", "#f5c400", "#2b2d7f",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#rrggbb` (leading `#` optional)
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Parse a hex color or one of the few named colors used in exports
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Some(Self { r: 255, g: 255, b: 255 }),
            "black" => Some(Self { r: 0, g: 0, b: 0 }),
            "none" | "transparent" => None,
            other => Self::parse_hex(other),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

/// Sample `t ∈ [0, 1]` from a piecewise-linear ramp through `stops`
fn sample_ramp(stops: &[&str], t: f64) -> Rgb {
    let colors: Vec<Rgb> = stops.iter().filter_map(|s| Rgb::parse_hex(s)).collect();
    if colors.len() == 1 {
        return colors[0];
    }
    let t = t.max(0.0).min(1.0);
    let scaled = t * (colors.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(colors.len() - 2);
    colors[i].lerp(colors[i + 1], scaled - i as f64)
}

/// `n` colors evenly sampled from the sequential ramp, lightest first
pub fn sequential_palette(n: usize) -> Vec<String> {
    match n {
        0 => Vec::new(),
        1 => vec![sample_ramp(&YL_OR_RD, 0.0).to_hex()],
        _ => (0..n)
            .map(|i| sample_ramp(&YL_OR_RD, i as f64 / (n - 1) as f64).to_hex())
            .collect(),
    }
}

/// Shared pool of distinct colors for categorical metadata values
#[derive(Debug, Clone, Default)]
pub struct CategoricalColormap;

impl CategoricalColormap {
    pub fn new() -> Self {
        Self
    }

    /// `n` distinct colors. Up to the base palette size the base colors are
    /// used as-is; beyond it the base palette is resampled as a ramp.
    pub fn n_scale(&self, n: usize) -> Vec<String> {
        if n <= CATEGORICAL.len() {
            return CATEGORICAL[..n].iter().map(|c| c.to_string()).collect();
        }
        (0..n)
            .map(|i| sample_ramp(&CATEGORICAL, i as f64 / (n - 1) as f64).to_hex())
            .collect()
    }
}
