//! Error type shared by the heatmap crates

use thiserror::Error;

/// Errors raised while building or mutating a heatmap
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeatmapError {
    #[error("Malformed matrix: {message}")]
    MalformedMatrix { message: String },

    #[error("Duplicate {axis} label: {label}")]
    DuplicateLabel { axis: &'static str, label: String },

    #[error("Unknown {axis} label: {label}")]
    UnknownLabel { axis: &'static str, label: String },

    #[error("Invalid option {name}: {message}")]
    InvalidOption { name: String, message: String },

    #[error("Export error: {message}")]
    Export { message: String },
}

impl HeatmapError {
    pub fn malformed_matrix<S: Into<String>>(message: S) -> Self {
        Self::MalformedMatrix { message: message.into() }
    }

    pub fn duplicate_label<S: Into<String>>(axis: &'static str, label: S) -> Self {
        Self::DuplicateLabel { axis, label: label.into() }
    }

    pub fn unknown_label<S: Into<String>>(axis: &'static str, label: S) -> Self {
        Self::UnknownLabel { axis, label: label.into() }
    }

    pub fn invalid_option<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self::InvalidOption {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn export<S: Into<String>>(message: S) -> Self {
        Self::Export { message: message.into() }
    }
}

impl From<csv::Error> for HeatmapError {
    fn from(err: csv::Error) -> Self {
        Self::export(format!("CSV writer error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, HeatmapError>;
