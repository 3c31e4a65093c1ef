// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for identity custodian operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for custodian operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the identity custodian and its KeyStore backends.
///
/// Variant names track the error kinds from the component design rather than
/// the underlying cause, so callers can match on `kind()` without parsing
/// messages. No variant ever carries key or password material.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input invalid: {0}")]
    InputInvalid(String),

    #[error("no identity is unlocked")]
    NotUnlocked,

    #[error("password did not authenticate the sealed identity")]
    BadPassword,

    #[error("sealed identity record is corrupt: {0}")]
    StoreCorrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("directory not accessible: {0}")]
    DirectoryNotAccessible(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The error kind, matching the taxonomy's names.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InputInvalid(_) => "InputInvalid",
            Error::NotUnlocked => "NotUnlocked",
            Error::BadPassword => "BadPassword",
            Error::StoreCorrupt(_) => "StoreCorrupt",
            Error::Io(_) => "StoreCorrupt",
            Error::Json(_) => "StoreCorrupt",
            Error::Sqlite(_) => "StoreCorrupt",
            Error::PermissionDenied(_) => "StoreCorrupt",
            Error::DirectoryNotAccessible(_) => "StoreCorrupt",
            Error::Config(_) => "InputInvalid",
        }
    }
}
