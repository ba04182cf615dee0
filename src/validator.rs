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

//! Lifecycle of the local test validator. Spawning suspends until either the
//! readiness line shows up on stdout or anything shows up on stderr; there is
//! no retry, a failed attempt is terminal for that call.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use regex::Regex;
use smol::{
    future,
    io::{AsyncBufReadExt, BufReader},
    process::{Child, Command, Stdio},
    stream::StreamExt,
    Timer,
};

use crate::{Error, Result};

/// Line on the validator's stdout signalling it accepts RPC connections.
pub const READY_PATTERN: &str = r"JSON RPC URL: http://127\.0\.0\.1:8899";

/// Default validator command.
pub const VALIDATOR_PROGRAM: &str = "solana-test-validator";

/// A running validator that can be told to go away.
pub trait ValidatorProcess: Send {
    /// Request termination. Fire-and-forget, exit is not awaited.
    fn terminate(&mut self);
}

/// Spawns a validator and resolves once it is ready to serve.
#[async_trait]
pub trait ValidatorLauncher: Send + Sync {
    async fn spawn(&self) -> Result<Box<dyn ValidatorProcess>>;
}

/// Handle around a spawned validator process.
pub struct ValidatorHandle {
    child: Child,
}

impl ValidatorProcess for ValidatorHandle {
    fn terminate(&mut self) {
        if let Err(e) = self.child.kill() {
            warn!(target: "validator", "Failed to kill validator: {}", e);
        }
    }
}

/// Production launcher for `solana-test-validator`.
pub struct TestValidator {
    command: Vec<String>,
    timeout: Duration,
}

impl TestValidator {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            command: vec![VALIDATOR_PROGRAM.to_string()],
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Override the spawned command line.
    pub fn with_command(mut self, argv: Vec<String>) -> Self {
        self.command = argv;
        self
    }
}

#[async_trait]
impl ValidatorLauncher for TestValidator {
    async fn spawn(&self) -> Result<Box<dyn ValidatorProcess>> {
        let ready_re = Regex::new(READY_PATTERN)?;

        let (bin, args) =
            self.command.split_first().ok_or(Error::ParseFailed("empty validator command"))?;

        let mut child =
            Command::new(bin).args(args).stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

        let stdout =
            child.stdout.take().ok_or(Error::ParseFailed("validator stdout not captured"))?;
        let stderr =
            child.stderr.take().ok_or(Error::ParseFailed("validator stderr not captured"))?;

        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = BufReader::new(stderr).lines();

        let readiness = async {
            while let Some(line) = out_lines.next().await {
                let line = line?;
                debug!(target: "validator", "{}", line);
                if ready_re.is_match(&line) {
                    return Ok(())
                }
            }
            Err(Error::ValidatorStartupFailed("stdout closed before readiness".to_string()))
        };

        let failure = async {
            if let Some(line) = err_lines.next().await {
                return Err(Error::ValidatorStartupFailed(
                    line.unwrap_or_else(|e| e.to_string()),
                ))
            }
            // A closed stderr never resolves the race.
            futures::future::pending::<Result<()>>().await
        };

        let deadline = async {
            Timer::after(self.timeout).await;
            Err(Error::ValidatorTimeout)
        };

        if let Err(e) = future::or(readiness, future::or(failure, deadline)).await {
            // A validator that never became ready is of no use to anyone.
            let _ = child.kill();
            return Err(e)
        }

        // Readiness observed, exactly once. Keep both pipes drained so the
        // validator never stalls on a full pipe.
        smol::spawn(async move { while out_lines.next().await.is_some() {} }).detach();
        smol::spawn(async move { while err_lines.next().await.is_some() {} }).detach();

        Ok(Box::new(ValidatorHandle { child }))
    }
}
