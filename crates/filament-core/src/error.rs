use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilamentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Insufficient data: {available} point(s) in fit window, need {required}")]
    InsufficientData { available: usize, required: usize },

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Corrupt frame {index}: {reason}")]
    CorruptFrame { index: usize, reason: String },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker panicked: {0}")]
    WorkerPanic(String),
}

impl FilamentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::ImageError(_) => ErrorKind::Image,
            Self::Csv(_) | Self::MalformedTable(_) => ErrorKind::Table,
            Self::EmptySequence => ErrorKind::EmptySequence,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::MissingInput(_) => ErrorKind::MissingInput,
            Self::CorruptFrame { .. } | Self::FrameIndexOutOfRange { .. } => {
                ErrorKind::CorruptFrame
            }
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::WorkerPanic(_) => ErrorKind::WorkerPanic,
        }
    }
}

/// Error classification recorded in summary rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    EmptySequence,
    DimensionMismatch,
    InsufficientData,
    /// Fit ran but missed the bound or R² criteria. Recorded, never raised.
    NonConvergentFit,
    MissingInput,
    CorruptFrame,
    InvalidConfig,
    Io,
    Image,
    Table,
    WorkerPanic,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptySequence => "EmptySequence",
            Self::DimensionMismatch => "DimensionMismatch",
            Self::InsufficientData => "InsufficientData",
            Self::NonConvergentFit => "NonConvergentFit",
            Self::MissingInput => "MissingInput",
            Self::CorruptFrame => "CorruptFrame",
            Self::InvalidConfig => "InvalidConfig",
            Self::Io => "Io",
            Self::Image => "Image",
            Self::Table => "Table",
            Self::WorkerPanic => "WorkerPanic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let kind = match s {
            "EmptySequence" => Self::EmptySequence,
            "DimensionMismatch" => Self::DimensionMismatch,
            "InsufficientData" => Self::InsufficientData,
            "NonConvergentFit" => Self::NonConvergentFit,
            "MissingInput" => Self::MissingInput,
            "CorruptFrame" => Self::CorruptFrame,
            "InvalidConfig" => Self::InvalidConfig,
            "Io" => Self::Io,
            "Image" => Self::Image,
            "Table" => Self::Table,
            "WorkerPanic" => Self::WorkerPanic,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, FilamentError>;
