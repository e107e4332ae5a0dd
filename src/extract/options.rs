use std::str::FromStr;

use crate::extract::values::ValueScope;

pub const DEFAULT_FALLBACK_HEADER: &str = "Data";
pub const LEGACY_FALLBACK_HEADER: &str = "Column1";

/// One table-building heuristic in the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Tab,
    WhitespaceRuns,
    Spacing,
    Pipe,
    Comma,
    Positional,
}

impl Strategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tab => "tab",
            Self::WhitespaceRuns => "spaces",
            Self::Spacing => "spacing",
            Self::Pipe => "pipe",
            Self::Comma => "comma",
            Self::Positional => "positional",
        }
    }

    #[must_use]
    pub const fn needs_geometry(self) -> bool {
        matches!(self, Self::Positional)
    }

    #[must_use]
    pub const fn delimiter(self) -> Option<char> {
        match self {
            Self::Tab => Some('\t'),
            Self::Pipe => Some('|'),
            Self::Comma => Some(','),
            Self::WhitespaceRuns | Self::Spacing | Self::Positional => None,
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tab" | "tabs" => Ok(Self::Tab),
            "spaces" | "whitespace" => Ok(Self::WhitespaceRuns),
            "spacing" => Ok(Self::Spacing),
            "pipe" => Ok(Self::Pipe),
            "comma" => Ok(Self::Comma),
            "positional" | "geometry" => Ok(Self::Positional),
            other => Err(format!(
                "unknown strategy '{other}', expected one of: tab, spaces, spacing, pipe, comma, positional"
            )),
        }
    }
}

/// Ordered list of strategies; the first structurally valid table wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cascade {
    strategies: Vec<Strategy>,
}

impl Cascade {
    #[must_use]
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// Tab first; pipe and comma only after spacing, since both show up
    /// inside numeric cells.
    #[must_use]
    pub fn tab_first() -> Self {
        Self::new(vec![
            Strategy::Tab,
            Strategy::WhitespaceRuns,
            Strategy::Pipe,
            Strategy::Comma,
        ])
    }

    #[must_use]
    pub fn spaces_first() -> Self {
        Self::new(vec![
            Strategy::WhitespaceRuns,
            Strategy::Tab,
            Strategy::Pipe,
            Strategy::Comma,
        ])
    }

    #[must_use]
    pub fn geometry_first() -> Self {
        let mut strategies = vec![Strategy::Positional];
        strategies.extend(Self::tab_first().strategies);
        Self::new(strategies)
    }

    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl FromStr for Cascade {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut strategies = Vec::new();
        for token in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let strategy = token.parse::<Strategy>()?;
            if strategies.contains(&strategy) {
                return Err(format!("strategy '{token}' is listed twice"));
            }
            strategies.push(strategy);
        }

        if strategies.is_empty() {
            return Err("cascade cannot be empty".to_string());
        }

        Ok(Self { strategies })
    }
}

/// Thresholds for the bounding-box clusterer, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    pub row_threshold: f32,
    pub column_gap: f32,
    pub max_align_distance: f32,
    pub min_confidence: f32,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            row_threshold: 15.0,
            column_gap: 30.0,
            max_align_distance: 50.0,
            min_confidence: 50.0,
        }
    }
}

impl ClusterParams {
    pub fn validate(&self) -> Result<(), String> {
        let distances = [
            ("row_threshold", self.row_threshold),
            ("column_gap", self.column_gap),
            ("max_align_distance", self.max_align_distance),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a positive number, got {value}"));
            }
        }

        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(format!(
                "min_confidence must be within 0..=100, got {}",
                self.min_confidence
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// `None` picks [`Cascade::geometry_first`] or [`Cascade::tab_first`]
    /// depending on the input.
    pub cascade: Option<Cascade>,
    pub cluster: ClusterParams,
    /// Applied to tables from the text strategies. The clusterer always
    /// validates every column but the first.
    pub value_scope: ValueScope,
    pub fallback_header: String,
    pub delimiter: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            cascade: None,
            cluster: ClusterParams::default(),
            value_scope: ValueScope::NumericColumns,
            fallback_header: DEFAULT_FALLBACK_HEADER.to_string(),
            delimiter: b',',
        }
    }
}
