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

//! Orchestration around the solang compiler, the solana CLIs and the local
//! test validator: compile Solidity sources to Solana artifacts, deploy them,
//! and run test suites against a freshly spun up local chain.

/// One-time local chain bootstrap and contract instantiation
pub mod bootstrap;

/// Compilation through the external solang compiler
pub mod compile;

/// Two-step fund-then-deploy pipeline
pub mod deploy;

/// External command execution seam
pub mod exec;

/// Persisted ed25519 keypairs
pub mod keypair;

/// Thin JSON-RPC client for the local validator
pub mod rpc;

/// Configuration surface
pub mod settings;

/// Test suite orchestration
pub mod suite;

/// Utilities
pub mod util;

/// Local test validator lifecycle
pub mod validator;

/// Error codes
mod error;
pub use error::{Error, Result};
