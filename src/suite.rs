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

//! The local test task: discover specs, compile everything, spin up the
//! validator, run the suite, tear the validator down again.

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use log::{error, info};

use crate::{
    compile::{compile, CompilerOptions},
    exec::CommandRunner,
    settings::ProjectPaths,
    util::file::{collect_files, MAX_WALK_DEPTH},
    validator::ValidatorLauncher,
    Error, Result,
};

/// Extensions of test spec files.
pub const SPEC_EXTS: [&str; 2] = [".test.js", ".test.ts"];

/// Resolve the set of test specs to run. Explicitly given paths are
/// absolutized and used verbatim; otherwise the tests root is searched.
pub async fn find_specs(tests_dir: &Path, explicit: &[String]) -> Result<Vec<PathBuf>> {
    if !explicit.is_empty() {
        let cwd = env::current_dir()?;
        return Ok(explicit
            .iter()
            .map(|file| {
                let path = PathBuf::from(file);
                if path.is_absolute() {
                    path
                } else {
                    cwd.join(path)
                }
            })
            .collect())
    }

    if !tests_dir.exists() {
        return Err(Error::NoTestsFound)
    }

    let mut specs: Vec<PathBuf> = collect_files(tests_dir, MAX_WALK_DEPTH)
        .await?
        .into_iter()
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            SPEC_EXTS.iter().any(|ext| name.ends_with(ext))
        })
        .collect();

    specs.sort();

    if specs.is_empty() {
        return Err(Error::NoTestsFound)
    }

    Ok(specs)
}

/// Executes a set of test specs, yielding the number of failed tests.
#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run(&self, specs: &[PathBuf]) -> Result<usize>;
}

/// Runs the specs through an external test runner process. The failure count
/// is taken straight from the exit code, which is how mocha reports it.
pub struct MochaRunner {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl MochaRunner {
    pub fn new(program: String, runner: Arc<dyn CommandRunner>) -> Self {
        Self { program, runner }
    }
}

#[async_trait]
impl TestRunner for MochaRunner {
    async fn run(&self, specs: &[PathBuf]) -> Result<usize> {
        let mut argv = vec![self.program.clone()];
        argv.extend(specs.iter().map(|spec| spec.display().to_string()));

        let out = self.runner.exec(&argv).await?;

        if !out.stdout.is_empty() {
            info!(target: "suite", "{}", out.stdout.trim_end());
        }
        if !out.stderr.is_empty() {
            error!(target: "suite", "{}", out.stderr.trim_end());
        }

        if out.success {
            return Ok(0)
        }

        Ok(out.status.filter(|code| *code > 0).unwrap_or(1) as usize)
    }
}

/// Orchestrates one full local test run.
pub struct TestSuite {
    paths: ProjectPaths,
    compiler: CompilerOptions,
    runner: Arc<dyn CommandRunner>,
    launcher: Arc<dyn ValidatorLauncher>,
    tests: Arc<dyn TestRunner>,
}

impl TestSuite {
    pub fn new(
        paths: ProjectPaths,
        compiler: CompilerOptions,
        runner: Arc<dyn CommandRunner>,
        launcher: Arc<dyn ValidatorLauncher>,
        tests: Arc<dyn TestRunner>,
    ) -> Self {
        Self { paths, compiler, runner, launcher, tests }
    }

    /// Run the suite. The validator is torn down whenever it was started,
    /// regardless of how the tests went; if startup itself failed there is
    /// nothing to tear down.
    pub async fn run(&self, test_files: &[String]) -> Result<()> {
        let specs = find_specs(&self.paths.tests, test_files).await?;

        compile(&self.compiler, &self.paths, self.runner.as_ref()).await?;

        let mut validator = self.launcher.spawn().await?;

        let outcome = self.tests.run(&specs).await;

        validator.terminate();

        let failures = outcome?;
        if failures != 0 {
            return Err(Error::TestSuiteFailed(failures))
        }

        info!(target: "suite", "Test suite passed ({} spec files)", specs.len());
        Ok(())
    }
}
