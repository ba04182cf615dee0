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

//! External command execution behind a seam, so orchestration code can be
//! exercised with stub runners. Commands are discrete argv token lists and
//! are never interpreted by a shell.

use async_trait::async_trait;
use smol::process::Command;

use crate::{Error, Result};

/// Captured outcome of a finished external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, if the process exited normally
    pub status: Option<i32>,
    pub success: bool,
}

/// Executes one external command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn exec(&self, argv: &[String]) -> Result<CommandOutput>;
}

/// Production runner spawning real processes with piped output.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn exec(&self, argv: &[String]) -> Result<CommandOutput> {
        let (bin, args) = argv.split_first().ok_or(Error::ParseFailed("empty command line"))?;

        let output = Command::new(bin).args(args).output().await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
            success: output.status.success(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_captures_streams_and_status() {
        smol::block_on(async {
            let argv: Vec<String> =
                ["sh", "-c", "echo out; echo err >&2; exit 3"].iter().map(|s| s.to_string()).collect();
            let out = ProcessRunner.exec(&argv).await.unwrap();

            assert_eq!(out.stdout.trim(), "out");
            assert_eq!(out.stderr.trim(), "err");
            assert_eq!(out.status, Some(3));
            assert!(!out.success);
        });
    }

    #[test]
    fn exec_rejects_empty_argv() {
        smol::block_on(async {
            assert!(ProcessRunner.exec(&[]).await.is_err());
        });
    }
}
