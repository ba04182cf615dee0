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

use std::{fs, io::Write, path::Path, process};

use crate::Result;

/// Map `-v` occurrences to a log level filter.
pub fn get_log_level(verbosity_level: u8) -> simplelog::LevelFilter {
    match verbosity_level {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    }
}

/// Build a logger configuration, honouring a comma-separated `LOG_TARGETS`
/// environment variable. Targets prefixed with `!` are ignored, the rest
/// are allowed exclusively.
pub fn get_log_config() -> simplelog::Config {
    match std::env::var("LOG_TARGETS") {
        Ok(x) => {
            let mut cfg = simplelog::ConfigBuilder::new();
            for target in x.split(',') {
                match target.strip_prefix('!') {
                    Some(ignore) => cfg.add_filter_ignore(ignore.to_string()),
                    None => cfg.add_filter_allow(target.to_string()),
                };
            }
            cfg.build()
        }
        Err(_) => simplelog::Config::default(),
    }
}

/// Create a default config file at the given path if it does not exist yet.
pub fn spawn_config(path: &Path, contents: &[u8]) -> Result<()> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(contents)?;
        println!("Config file created in {:?}. Please review it and try again.", path);
        process::exit(2);
    }

    Ok(())
}

/// Construct a CLI description string from the package metadata.
#[macro_export]
macro_rules! cli_desc {
    () => {{
        let mut desc = env!("CARGO_PKG_DESCRIPTION").to_string();
        desc.push('\n');
        desc.push_str(env!("CARGO_PKG_HOMEPAGE"));
        Box::leak(desc.into_boxed_str()) as &'static str
    }};
}

/// Wrap an async entrypoint into a `main` that layers CLI arguments over the
/// TOML config file, initializes the logger, and drives a thread-per-core
/// smol executor until the entrypoint returns.
///
/// The invoking crate must declare `Args`, `CONFIG_FILE` and
/// `CONFIG_FILE_CONTENTS`.
#[macro_export]
macro_rules! async_daemonize {
    ($realmain:ident) => {
        fn main() -> $crate::Result<()> {
            let args = Args::from_args_with_toml("").unwrap();
            let cfg_path = $crate::util::path::get_config_path(args.config, CONFIG_FILE)?;
            $crate::util::cli::spawn_config(&cfg_path, CONFIG_FILE_CONTENTS.as_bytes())?;
            let args =
                Args::from_args_with_toml(&std::fs::read_to_string(cfg_path)?).unwrap();

            let log_level = $crate::util::cli::get_log_level(args.verbose);
            let log_config = $crate::util::cli::get_log_config();

            match args.log {
                Some(ref log_path) => {
                    let log_path = $crate::util::path::expand_path(log_path)?;
                    let log_file = std::fs::File::create(log_path)?;
                    simplelog::CombinedLogger::init(vec![
                        simplelog::TermLogger::new(
                            log_level,
                            log_config.clone(),
                            simplelog::TerminalMode::Mixed,
                            simplelog::ColorChoice::Auto,
                        ),
                        simplelog::WriteLogger::new(log_level, log_config, log_file),
                    ])?;
                }
                None => {
                    simplelog::TermLogger::init(
                        log_level,
                        log_config,
                        simplelog::TerminalMode::Mixed,
                        simplelog::ColorChoice::Auto,
                    )?;
                }
            }

            // https://docs.rs/smol/latest/smol/struct.Executor.html#examples
            let n_threads = std::thread::available_parallelism().unwrap().get();
            let ex = std::sync::Arc::new(smol::Executor::new());
            let (signal, shutdown) = smol::channel::unbounded::<()>();
            let (_, result) = easy_parallel::Parallel::new()
                .each(0..n_threads, |_| smol::future::block_on(ex.run(shutdown.recv())))
                .finish(|| {
                    smol::future::block_on(async {
                        let result = $realmain(args, ex.clone()).await;
                        drop(signal);
                        result
                    })
                });

            result
        }
    };
}
