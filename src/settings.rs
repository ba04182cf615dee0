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

use std::path::PathBuf;

use crate::compile::CompilerOptions;

/// Workspace directory layout.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// Directory holding the Solidity sources
    pub sources: PathBuf,
    /// Output directory for compiled artifacts
    pub artifacts: PathBuf,
    /// Directory holding the test specs
    pub tests: PathBuf,
}

impl Default for ProjectPaths {
    fn default() -> Self {
        Self {
            sources: PathBuf::from("contracts"),
            artifacts: PathBuf::from("artifacts"),
            tests: PathBuf::from("test"),
        }
    }
}

/// Full configuration surface consumed by the orchestration layer.
#[derive(Debug, Clone)]
pub struct Settings {
    pub paths: ProjectPaths,
    /// Default network used for deployments
    pub network: Option<String>,
    pub compiler: CompilerOptions,
    /// Seconds to wait for the local validator to accept RPC connections
    pub validator_timeout: u64,
    /// External test runner executed over the discovered test specs
    pub test_program: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: ProjectPaths::default(),
            network: None,
            compiler: CompilerOptions::default(),
            validator_timeout: 60,
            test_program: "mocha".to_string(),
        }
    }
}
