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

//! Two-step deployment pipeline: fund the payer through the wallet CLI, then
//! hand the artifact to the deploy CLI and read the program id out of its
//! JSON output. The second step never runs when the first one failed.

use std::{collections::HashMap, fmt, path::PathBuf, str::FromStr};

use log::info;
use tinyjson::JsonValue;

use crate::{exec::CommandRunner, settings::ProjectPaths, Error, Result};

/// RPC endpoint of the local test validator.
pub const LOCAL_RPC_URL: &str = "http://localhost:8899";

/// Default airdrop amount requested before deploying.
pub const DEFAULT_AIRDROP: u64 = 419;

/// Artifact deployed when no file is given.
pub const BUNDLE_FILE: &str = "bundle.so";

/// Extension carried by deployable artifacts.
pub const ARTIFACT_EXT: &str = ".so";

/// Networks the deploy pipeline is willing to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Localhost,
}

impl Network {
    /// Endpoint value handed to the external CLIs.
    pub fn endpoint(&self) -> String {
        match self {
            Self::Localhost => LOCAL_RPC_URL.to_string(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet-beta"),
            Self::Testnet => write!(f, "testnet"),
            Self::Devnet => write!(f, "devnet"),
            Self::Localhost => write!(f, "localhost"),
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet-beta" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "devnet" => Ok(Self::Devnet),
            "localhost" => Ok(Self::Localhost),
            _ => Err(Error::UnsupportedNetwork(s.to_string())),
        }
    }
}

/// Parameters of one deployment.
#[derive(Debug, Clone)]
pub struct DeployParams {
    pub file: Option<String>,
    pub network: Option<String>,
    pub keypath: Option<String>,
    pub signer: Option<String>,
    pub airdrop: u64,
}

impl Default for DeployParams {
    fn default() -> Self {
        Self { file: None, network: None, keypath: None, signer: None, airdrop: DEFAULT_AIRDROP }
    }
}

/// Resolve the artifact path: default bundle name, forced extension,
/// relative paths anchored at the artifacts directory.
fn resolve_artifact(paths: &ProjectPaths, file: Option<&str>) -> PathBuf {
    let filename = file.unwrap_or(BUNDLE_FILE);
    let filename = if filename.ends_with(ARTIFACT_EXT) {
        filename.to_string()
    } else {
        format!("{}{}", filename, ARTIFACT_EXT)
    };

    let path = PathBuf::from(&filename);
    if path.is_absolute() {
        path
    } else {
        paths.artifacts.join(path)
    }
}

/// Fund the payer, deploy the artifact, return the program id.
pub async fn deploy(
    paths: &ProjectPaths,
    default_network: Option<&str>,
    runner: &dyn CommandRunner,
    params: &DeployParams,
) -> Result<String> {
    let network =
        Network::from_str(params.network.as_deref().or(default_network).unwrap_or("localhost"))?;
    let endpoint = network.endpoint();

    let filepath = resolve_artifact(paths, params.file.as_deref());

    let mut argv: Vec<String> = vec![
        "solana".to_string(),
        "airdrop".to_string(),
        "--commitment".to_string(),
        "confirmed".to_string(),
        "-u".to_string(),
        endpoint.clone(),
    ];
    if let Some(keypath) = &params.keypath {
        argv.push("-k".to_string());
        argv.push(keypath.clone());
    }
    argv.push("--output".to_string());
    argv.push("json".to_string());
    argv.push(params.airdrop.to_string());

    let funded = runner.exec(&argv).await?;
    if !funded.stderr.is_empty() {
        return Err(Error::AirdropFailed(funded.stderr))
    }

    let mut argv: Vec<String> = vec![
        "solana".to_string(),
        "deploy".to_string(),
        "--commitment".to_string(),
        "confirmed".to_string(),
        "-u".to_string(),
        endpoint,
    ];
    if let Some(keypath) = &params.keypath {
        argv.push("-k".to_string());
        argv.push(keypath.clone());
    }
    argv.push("--output".to_string());
    argv.push("json".to_string());
    argv.push(filepath.display().to_string());
    if let Some(signer) = &params.signer {
        argv.push(signer.clone());
    }

    let deployed = runner.exec(&argv).await?;
    if !deployed.stderr.is_empty() {
        return Err(Error::DeployFailed(deployed.stderr))
    }

    let json: JsonValue = deployed
        .stdout
        .parse()
        .map_err(|_| Error::MalformedDeployOutput("deploy output is not valid JSON"))?;

    let Some(fields) = json.get::<HashMap<String, JsonValue>>() else {
        return Err(Error::MalformedDeployOutput("deploy output is not an object"))
    };

    let Some(program_id) = fields.get("programId").and_then(|v| v.get::<String>()) else {
        return Err(Error::MalformedDeployOutput("programId missing from deploy output"))
    };

    info!(target: "deploy", "Deployed {} as program {}", filepath.display(), program_id);
    Ok(program_id.clone())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::exec::CommandOutput;

    #[test]
    fn known_networks_are_accepted() {
        for name in ["mainnet-beta", "testnet", "devnet", "localhost"] {
            assert!(Network::from_str(name).is_ok());
        }

        assert!(matches!(Network::from_str("foo"), Err(Error::UnsupportedNetwork(_))));
        assert!(matches!(Network::from_str("Localhost"), Err(Error::UnsupportedNetwork(_))));
    }

    #[test]
    fn localhost_maps_to_the_loopback_endpoint() {
        assert_eq!(Network::Localhost.endpoint(), LOCAL_RPC_URL);
        assert_eq!(Network::Devnet.endpoint(), "devnet");
    }

    fn paths() -> ProjectPaths {
        ProjectPaths {
            sources: PathBuf::from("contracts"),
            artifacts: PathBuf::from("/work/artifacts"),
            tests: PathBuf::from("test"),
        }
    }

    #[test]
    fn artifact_names_are_normalized() {
        let paths = paths();

        assert_eq!(
            resolve_artifact(&paths, Some("bundle")),
            PathBuf::from("/work/artifacts/bundle.so")
        );
        assert_eq!(
            resolve_artifact(&paths, Some("bundle.so")),
            PathBuf::from("/work/artifacts/bundle.so")
        );
        assert_eq!(resolve_artifact(&paths, Some("/abs/other.so")), PathBuf::from("/abs/other.so"));
        assert_eq!(resolve_artifact(&paths, None), PathBuf::from("/work/artifacts/bundle.so"));
    }

    /// Records every invocation and replays scripted outputs in order.
    struct ReplayRunner {
        outputs: Mutex<Vec<CommandOutput>>,
        seen: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl ReplayRunner {
        fn new(outputs: Vec<CommandOutput>) -> (Self, Arc<Mutex<Vec<Vec<String>>>>) {
            let seen = Arc::new(Mutex::new(vec![]));
            (Self { outputs: Mutex::new(outputs), seen: seen.clone() }, seen)
        }
    }

    #[async_trait]
    impl CommandRunner for ReplayRunner {
        async fn exec(&self, argv: &[String]) -> Result<CommandOutput> {
            self.seen.lock().unwrap().push(argv.to_vec());
            Ok(self.outputs.lock().unwrap().remove(0))
        }
    }

    fn ok_output(stdout: &str) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            status: Some(0),
            success: true,
        }
    }

    fn err_output(stderr: &str) -> CommandOutput {
        CommandOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            status: Some(1),
            success: false,
        }
    }

    #[test]
    fn failed_airdrop_never_reaches_the_deploy_cli() {
        smol::block_on(async {
            let (runner, seen) = ReplayRunner::new(vec![err_output("insufficient faucet")]);

            let result = deploy(&paths(), None, &runner, &DeployParams::default()).await;
            assert!(matches!(result, Err(Error::AirdropFailed(_))));

            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0][1], "airdrop");
        });
    }

    #[test]
    fn program_id_is_read_from_the_deploy_output() {
        smol::block_on(async {
            let (runner, seen) = ReplayRunner::new(vec![
                ok_output("{}"),
                ok_output(r#"{"programId":"9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"}"#),
            ]);

            let id = deploy(&paths(), None, &runner, &DeployParams::default()).await.unwrap();
            assert_eq!(id, "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin");

            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[1][1], "deploy");
            // Local deployments talk to the loopback endpoint.
            assert!(seen.iter().all(|argv| argv.contains(&LOCAL_RPC_URL.to_string())));
            // And the artifact path lands on the deploy command line.
            assert!(seen[1].contains(&"/work/artifacts/bundle.so".to_string()));
        });
    }

    #[test]
    fn malformed_deploy_output_is_a_hard_failure() {
        smol::block_on(async {
            let (runner, _) =
                ReplayRunner::new(vec![ok_output("{}"), ok_output("not json at all")]);

            let result = deploy(&paths(), None, &runner, &DeployParams::default()).await;
            assert!(matches!(result, Err(Error::MalformedDeployOutput(_))));
        });
    }

    #[test]
    fn missing_program_id_is_a_hard_failure() {
        smol::block_on(async {
            let (runner, _) =
                ReplayRunner::new(vec![ok_output("{}"), ok_output(r#"{"other":1}"#)]);

            let result = deploy(&paths(), None, &runner, &DeployParams::default()).await;
            assert!(matches!(result, Err(Error::MalformedDeployOutput(_))));
        });
    }

    #[test]
    fn unknown_network_fails_before_any_invocation() {
        smol::block_on(async {
            let (runner, seen) = ReplayRunner::new(vec![]);

            let params = DeployParams { network: Some("foo".to_string()), ..Default::default() };
            let result = deploy(&paths(), None, &runner, &params).await;

            assert!(matches!(result, Err(Error::UnsupportedNetwork(_))));
            assert!(seen.lock().unwrap().is_empty());
        });
    }

    #[test]
    fn configured_default_network_is_used() {
        smol::block_on(async {
            let (runner, seen) = ReplayRunner::new(vec![
                ok_output("{}"),
                ok_output(r#"{"programId":"x"}"#),
            ]);

            deploy(&paths(), Some("devnet"), &runner, &DeployParams::default()).await.unwrap();

            let seen = seen.lock().unwrap();
            assert!(seen.iter().all(|argv| argv.contains(&"devnet".to_string())));
        });
    }
}
