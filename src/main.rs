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

use std::sync::Arc;

use structopt_toml::{serde::Deserialize, structopt::StructOpt, StructOptToml};

use solsmith::{
    async_daemonize, cli_desc,
    compile::{compile, CompilerOptions},
    deploy::{deploy, DeployParams, DEFAULT_AIRDROP},
    exec::{CommandRunner, ProcessRunner},
    settings::{ProjectPaths, Settings},
    suite::{MochaRunner, TestRunner, TestSuite},
    util::path::expand_path,
    validator::{TestValidator, ValidatorLauncher},
    Error, Result,
};

const CONFIG_FILE: &str = "solsmith_config.toml";
const CONFIG_FILE_CONTENTS: &str = include_str!("../solsmith_config.toml");

#[derive(Clone, Debug, Deserialize, StructOpt, StructOptToml)]
#[serde(default)]
#[structopt(name = "solsmith", about = cli_desc!())]
struct Args {
    #[structopt(short, long)]
    /// Configuration file to use
    config: Option<String>,

    #[structopt(long, default_value = "contracts")]
    /// Directory holding the Solidity sources
    sources: String,

    #[structopt(long, default_value = "artifacts")]
    /// Output directory for compiled artifacts
    artifacts: String,

    #[structopt(long, default_value = "test")]
    /// Directory holding the test specs
    tests: String,

    #[structopt(long)]
    /// Default network used for deployments
    network: Option<String>,

    #[structopt(long, default_value = "solana")]
    /// Compilation target passed to solang
    target: String,

    #[structopt(long, default_value = "default")]
    /// Optimization level passed to solang
    opt_level: String,

    #[structopt(long)]
    /// Disable the constant folding optimization pass
    no_constant_folding: bool,

    #[structopt(long)]
    /// Disable the strength reduction optimization pass
    no_strength_reduce: bool,

    #[structopt(long)]
    /// Disable the dead storage elimination pass
    no_dead_storage: bool,

    #[structopt(long)]
    /// Disable the vector to slice conversion pass
    no_vector_to_slice: bool,

    #[structopt(long)]
    /// Enable runtime arithmetic overflow checks
    math_overflow: bool,

    #[structopt(long = "import-map")]
    /// Ordered import remappings handed to solang (alias=path)
    import_map: Vec<String>,

    #[structopt(long, default_value = "60")]
    /// Seconds to wait for the local validator to accept RPC connections
    validator_timeout: u64,

    #[structopt(long, default_value = "mocha")]
    /// External test runner executed over the discovered test specs
    test_program: String,

    #[structopt(subcommand)]
    /// Sub command to execute
    command: Subcmd,

    #[structopt(short, long)]
    /// Set log file to ouput into
    log: Option<String>,

    #[structopt(short, parse(from_occurrences))]
    /// Increase verbosity (-vvv supported)
    verbose: u8,
}

#[derive(Clone, Debug, Deserialize, StructOpt)]
enum Subcmd {
    /// Compile solang compatible Solidity to Solana artifacts
    Compile,

    /// Spin up solana-test-validator and run a test suite locally
    Test {
        /// Explicit test files to run instead of globbing the tests root
        test_files: Vec<String>,
    },

    /// Fund the payer and deploy an artifact to a network
    Deploy {
        #[structopt(long)]
        /// Artifact to deploy (defaults to bundle.so)
        file: Option<String>,

        #[structopt(long)]
        /// Network to deploy to (overrides the configured default)
        network: Option<String>,

        #[structopt(long)]
        /// Key file handed to the external CLIs
        keypath: Option<String>,

        #[structopt(long)]
        /// Extra signer token appended to the deploy command
        signer: Option<String>,

        #[structopt(long)]
        /// Airdrop amount requested before deploying
        airdrop: Option<u64>,
    },
}

fn parse_import_map(entries: &[String]) -> Result<Vec<(String, String)>> {
    let mut map = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some((alias, path)) = entry.split_once('=') else {
            return Err(Error::ParseFailed("import mapping must be alias=path"))
        };
        map.push((alias.to_string(), path.to_string()));
    }

    Ok(map)
}

async_daemonize!(realmain);
async fn realmain(args: Args, _ex: Arc<smol::Executor<'static>>) -> Result<()> {
    let settings = Settings {
        paths: ProjectPaths {
            sources: expand_path(&args.sources)?,
            artifacts: expand_path(&args.artifacts)?,
            tests: expand_path(&args.tests)?,
        },
        network: args.network.clone(),
        compiler: CompilerOptions {
            target: args.target.parse()?,
            opt_level: args.opt_level.parse()?,
            no_constant_folding: args.no_constant_folding,
            no_strength_reduce: args.no_strength_reduce,
            no_dead_storage: args.no_dead_storage,
            no_vector_to_slice: args.no_vector_to_slice,
            math_overflow: args.math_overflow,
            import_map: parse_import_map(&args.import_map)?,
        },
        validator_timeout: args.validator_timeout,
        test_program: args.test_program.clone(),
    };

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);

    match args.command {
        Subcmd::Compile => {
            compile(&settings.compiler, &settings.paths, runner.as_ref()).await
        }

        Subcmd::Test { test_files } => {
            let launcher: Arc<dyn ValidatorLauncher> =
                Arc::new(TestValidator::new(settings.validator_timeout));
            let tests: Arc<dyn TestRunner> =
                Arc::new(MochaRunner::new(settings.test_program.clone(), runner.clone()));

            let suite =
                TestSuite::new(settings.paths, settings.compiler, runner, launcher, tests);
            suite.run(&test_files).await
        }

        Subcmd::Deploy { file, network, keypath, signer, airdrop } => {
            let params = DeployParams {
                file,
                network,
                keypath,
                signer,
                airdrop: airdrop.unwrap_or(DEFAULT_AIRDROP),
            };

            let program_id =
                deploy(&settings.paths, settings.network.as_deref(), runner.as_ref(), &params)
                    .await?;
            println!("{}", program_id);
            Ok(())
        }
    }
}
