// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! The aggregation engine itself never fails; these errors cover the
//! collaborators around it (equipment store, ride loading, startup).

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Whether the failure came from the filesystem rather than the data.
    pub fn is_io(&self) -> bool {
        matches!(self, AppError::Io(_))
            || matches!(self, AppError::Persistence(msg) if msg.starts_with(Self::WRITE_FAILED))
    }

    /// Prefix used for store write failures.
    pub const WRITE_FAILED: &'static str = "write failed";
}

/// Result type alias for fallible collaborator calls
pub type Result<T> = std::result::Result<T, AppError>;
