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

//! Compilation of Solidity sources through the external solang compiler.
//! One compiler invocation per source file, all launched concurrently and
//! all run to completion regardless of the others' outcomes.

use std::{fmt, path::{Path, PathBuf}, str::FromStr};

use futures::future::join_all;
use log::{error, info};
use smol::fs;

use crate::{
    exec::CommandRunner,
    settings::ProjectPaths,
    util::file::{collect_files, MAX_WALK_DEPTH},
    Error, Result,
};

/// Extension of contract source files.
pub const SOURCE_EXT: &str = "sol";

/// Compilation targets supported by solang.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Solana,
    Substrate,
    Ewasm,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solana => write!(f, "solana"),
            Self::Substrate => write!(f, "substrate"),
            Self::Ewasm => write!(f, "ewasm"),
        }
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "solana" => Ok(Self::Solana),
            "substrate" => Ok(Self::Substrate),
            "ewasm" => Ok(Self::Ewasm),
            _ => Err(Error::ParseFailed("unknown compilation target")),
        }
    }
}

/// Optimization levels understood by solang's `-O` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptLevel {
    None,
    Less,
    Default,
    Aggressive,
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Less => write!(f, "less"),
            Self::Default => write!(f, "default"),
            Self::Aggressive => write!(f, "aggressive"),
        }
    }
}

impl FromStr for OptLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "less" => Ok(Self::Less),
            "default" => Ok(Self::Default),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(Error::ParseFailed("unknown optimization level")),
        }
    }
}

/// Options for a single compile run. Immutable once constructed; the same
/// options always render the same command line.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub target: Target,
    pub opt_level: OptLevel,
    pub no_constant_folding: bool,
    pub no_strength_reduce: bool,
    pub no_dead_storage: bool,
    pub no_vector_to_slice: bool,
    pub math_overflow: bool,
    /// Import remappings in declared order. The ordering is part of the
    /// command line contract, so this is a list and not a map.
    pub import_map: Vec<(String, String)>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            target: Target::Solana,
            opt_level: OptLevel::Default,
            no_constant_folding: false,
            no_strength_reduce: false,
            no_dead_storage: false,
            no_vector_to_slice: false,
            math_overflow: false,
            import_map: vec![],
        }
    }
}

/// Render the solang command line for one source file. The token order is a
/// compatibility contract with solang's argument parser: disable flags,
/// overflow flag, import mappings, optimization level, include directory,
/// output directory, source path, target.
pub fn solang_args(
    opts: &CompilerOptions,
    sources_dir: &Path,
    artifacts_dir: &Path,
    source: &Path,
) -> Vec<String> {
    let mut argv = vec!["solang".to_string()];

    if opts.no_constant_folding {
        argv.push("--no-constant-folding".to_string());
    }
    if opts.no_strength_reduce {
        argv.push("--no-strength-reduce".to_string());
    }
    if opts.no_dead_storage {
        argv.push("--no-dead-storage".to_string());
    }
    if opts.no_vector_to_slice {
        argv.push("--no-vector-to-slice".to_string());
    }
    if opts.math_overflow {
        argv.push("--math-overflow".to_string());
    }

    for (alias, path) in &opts.import_map {
        argv.push("-m".to_string());
        argv.push(format!("{}={}", alias, path));
    }

    argv.push("-O".to_string());
    argv.push(opts.opt_level.to_string());
    argv.push("-I".to_string());
    argv.push(sources_dir.display().to_string());
    argv.push("-o".to_string());
    argv.push(artifacts_dir.display().to_string());
    argv.push(source.display().to_string());
    argv.push("--target".to_string());
    argv.push(opts.target.to_string());

    argv
}

/// Find every contract source under `dir`. Paths are absolute, sorted and
/// deduplicated so reporting stays stable across runs.
pub async fn find_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::NoSourcesFound)
    }

    let root = fs::canonicalize(dir).await?;

    let mut sources: Vec<PathBuf> = collect_files(&root, MAX_WALK_DEPTH)
        .await?
        .into_iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == SOURCE_EXT))
        .collect();

    sources.sort();
    sources.dedup();

    if sources.is_empty() {
        return Err(Error::NoSourcesFound)
    }

    Ok(sources)
}

/// Outcome of one compiler invocation.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub source: PathBuf,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// All invocation outcomes of one compile run, in source order.
#[derive(Debug, Clone)]
pub struct CompileRun {
    pub results: Vec<CompileResult>,
}

impl CompileRun {
    pub fn success(&self) -> bool {
        self.results.iter().all(|result| result.success)
    }
}

/// Compile every discovered source concurrently. A failing invocation never
/// cancels the others; each result is fully populated either way.
pub async fn compile_sources(
    opts: &CompilerOptions,
    paths: &ProjectPaths,
    runner: &dyn CommandRunner,
) -> Result<CompileRun> {
    let sources = find_sources(&paths.sources).await?;

    fs::create_dir_all(&paths.artifacts).await?;

    let jobs = sources.iter().map(|source| {
        let argv = solang_args(opts, &paths.sources, &paths.artifacts, source);
        async move {
            match runner.exec(&argv).await {
                Ok(out) => CompileResult {
                    source: source.clone(),
                    stdout: out.stdout,
                    stderr: out.stderr,
                    success: out.success,
                },
                Err(e) => CompileResult {
                    source: source.clone(),
                    stdout: String::new(),
                    stderr: e.to_string(),
                    success: false,
                },
            }
        }
    });

    let results = join_all(jobs).await;

    for result in &results {
        if !result.stdout.is_empty() {
            info!(target: "compile", "{}", result.stdout.trim_end());
        }
        if !result.stderr.is_empty() {
            error!(target: "compile", "{}", result.stderr.trim_end());
        }
    }

    Ok(CompileRun { results })
}

/// The compile task: fail unless every source compiled.
pub async fn compile(
    opts: &CompilerOptions,
    paths: &ProjectPaths,
    runner: &dyn CommandRunner,
) -> Result<()> {
    let run = compile_sources(opts, paths, runner).await?;

    if !run.success() {
        return Err(Error::CompileFailed)
    }

    info!(target: "compile", "Artifacts written to {}", paths.artifacts.display());
    Ok(())
}
