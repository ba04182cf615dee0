/* This file is part of solsmith
 *
 * Copyright (C) 2024-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

// Please add your error to the according subsection that is commented,
// or make a new subsection. Keep it clean.

/// Main result type used throughout the codebase.
pub type Result<T> = std::result::Result<T, Error>;

/// General errors used throughout the codebase.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    // ===================
    // Compile task errors
    // ===================
    #[error("No source files found")]
    NoSourcesFound,

    #[error("solang failed to compile some source files")]
    CompileFailed,

    // ==========================
    // Validator lifecycle errors
    // ==========================
    #[error("Validator startup failed: {0}")]
    ValidatorStartupFailed(String),

    #[error("Gave up waiting for validator readiness")]
    ValidatorTimeout,

    // =================
    // Test suite errors
    // =================
    #[error("No test files found")]
    NoTestsFound,

    #[error("Test suite failed with {0} failing test(s)")]
    TestSuiteFailed(usize),

    // =================
    // Deployment errors
    // =================
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Airdrop failed: {0}")]
    AirdropFailed(String),

    #[error("Deploy failed: {0}")]
    DeployFailed(String),

    #[error("Malformed deploy output: {0}")]
    MalformedDeployOutput(&'static str),

    // =======================
    // Key and contract errors
    // =======================
    #[error("Key file error: {0}")]
    KeyFileError(String),

    #[error("Failed loading contract ABI: {0}")]
    AbiLoadError(String),

    // ==========
    // RPC errors
    // ==========
    #[error("JSON-RPC error: {0}")]
    JsonRpcError(String),

    // ====================
    // Miscellaneous errors
    // ====================
    #[error("Parse failed: {0}")]
    ParseFailed(&'static str),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("JSON generate error: {0}")]
    JsonGenerateError(String),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RegexError(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),

    #[error("SetLogger (log crate) failed: {0}")]
    SetLoggerError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.kind())
    }
}

impl From<tinyjson::JsonParseError> for Error {
    fn from(err: tinyjson::JsonParseError) -> Self {
        Self::JsonParseError(err.to_string())
    }
}

impl From<tinyjson::JsonGenerateError> for Error {
    fn from(err: tinyjson::JsonGenerateError) -> Self {
        Self::JsonGenerateError(err.to_string())
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Self::SetLoggerError(err.to_string())
    }
}
