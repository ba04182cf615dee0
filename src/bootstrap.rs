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

//! One-time local chain bootstrap (funded payer, loaded program) and per-call
//! contract instantiation against it. The chain collaborators live behind
//! traits; only their interface is this crate's business.

use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use smol::{fs, lock::Mutex};
use tinyjson::JsonValue;
use url::Url;

use crate::{
    deploy::{BUNDLE_FILE, LOCAL_RPC_URL},
    keypair::SmithKeypair,
    settings::ProjectPaths,
    util::file::load_json_file,
    Error, Result,
};

/// Funding granted to the ephemeral payer.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Well-known loader identity program bytecode is loaded under.
pub const BPF_LOADER_ID: &str = "BPFLoader2111111111111111111111111111111111";

/// Persisted payer key, under the tests root.
pub const PAYER_KEY_FILE: &str = ".payer.key";

/// Persisted program identity key, under the tests root.
pub const PROGRAM_KEY_FILE: &str = ".program.key";

/// Default storage account allocation for a contract instance.
pub const DEFAULT_STORAGE_SPACE: u64 = 8192;

/// The few RPC calls the bootstrap needs from the network client.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Request an airdrop, returning the transaction signature.
    async fn request_airdrop(&self, address: &str, lamports: u64) -> Result<String>;

    /// Wait until the transaction reaches confirmed commitment.
    async fn confirm_transaction(&self, signature: &str) -> Result<()>;
}

/// Loads raw program bytecode into a program identity via [`BPF_LOADER_ID`].
#[async_trait]
pub trait ProgramLoader: Send + Sync {
    async fn load(
        &self,
        payer: &SmithKeypair,
        program: &SmithKeypair,
        bytecode: &[u8],
    ) -> Result<()>;
}

/// A contract client bound to one connection, program, storage and payer.
#[async_trait]
pub trait ContractClient: Send + Sync {
    async fn deploy(
        &self,
        constructor: &str,
        args: &[JsonValue],
        program: &SmithKeypair,
        storage: &SmithKeypair,
        space: u64,
    ) -> Result<()>;
}

/// Builds contract clients from their bound identities and parsed ABI.
pub trait ContractFactory: Send + Sync {
    fn contract(
        &self,
        url: &Url,
        program: &SmithKeypair,
        storage: &SmithKeypair,
        abi: &JsonValue,
        payer: &SmithKeypair,
    ) -> Result<Box<dyn ContractClient>>;
}

/// Everything a freshly instantiated contract came with.
pub struct ContractHandle {
    pub client: Box<dyn ContractClient>,
    pub url: Url,
    pub payer: SmithKeypair,
    pub program: SmithKeypair,
    pub storage: SmithKeypair,
    pub abi: JsonValue,
}

/// Local chain environment. The bootstrap cell is part of this value, not a
/// process-wide static, so tests get a fresh one per instance; concurrent
/// first calls serialize on its lock and setup runs at most once.
pub struct LocalEnv {
    paths: ProjectPaths,
    rpc: Arc<dyn ChainRpc>,
    loader: Arc<dyn ProgramLoader>,
    contracts: Arc<dyn ContractFactory>,
    bootstrapped: Mutex<bool>,
}

impl LocalEnv {
    pub fn new(
        paths: ProjectPaths,
        rpc: Arc<dyn ChainRpc>,
        loader: Arc<dyn ProgramLoader>,
        contracts: Arc<dyn ContractFactory>,
    ) -> Self {
        Self { paths, rpc, loader, contracts, bootstrapped: Mutex::new(false) }
    }

    pub async fn is_bootstrapped(&self) -> bool {
        *self.bootstrapped.lock().await
    }

    /// One-time environment setup: funded payer, program identity, loaded
    /// bytecode, both keys persisted. Holding the lock across the whole run
    /// keeps a second caller parked until the flag is set.
    async fn setup(&self) -> Result<()> {
        let mut done = self.bootstrapped.lock().await;
        if *done {
            return Ok(())
        }

        let payer = SmithKeypair::generate();
        let signature = self.rpc.request_airdrop(&payer.address(), LAMPORTS_PER_SOL).await?;
        self.rpc.confirm_transaction(&signature).await?;

        let program = SmithKeypair::generate();
        let bytecode = fs::read(self.paths.artifacts.join(BUNDLE_FILE)).await?;
        self.loader.load(&payer, &program, &bytecode).await?;

        payer.save(&self.paths.tests.join(PAYER_KEY_FILE)).await?;
        program.save(&self.paths.tests.join(PROGRAM_KEY_FILE)).await?;

        *done = true;
        info!(target: "bootstrap", "Local environment ready (payer {})", payer.address());
        Ok(())
    }

    /// Instantiate a contract with the default storage allocation against
    /// the local endpoint.
    pub async fn contract(
        &self,
        name: &str,
        abifile: &str,
        args: &[JsonValue],
    ) -> Result<ContractHandle> {
        let url = Url::parse(LOCAL_RPC_URL)?;
        self.contract_with(name, abifile, args, DEFAULT_STORAGE_SPACE, &url).await
    }

    /// Instantiate a contract: parse its ABI, rebuild the persisted
    /// identities, allocate fresh storage and drive the client's deploy.
    /// Handles are never reused across calls.
    pub async fn contract_with(
        &self,
        name: &str,
        abifile: &str,
        args: &[JsonValue],
        space: u64,
        url: &Url,
    ) -> Result<ContractHandle> {
        self.setup().await?;

        let abi = load_json_file(&self.paths.artifacts.join(abifile))
            .await
            .map_err(|e| Error::AbiLoadError(e.to_string()))?;

        let payer = SmithKeypair::load(&self.paths.tests.join(PAYER_KEY_FILE)).await?;
        let program = SmithKeypair::load(&self.paths.tests.join(PROGRAM_KEY_FILE)).await?;
        let storage = SmithKeypair::generate();

        let client = self.contracts.contract(url, &program, &storage, &abi, &payer)?;
        client.deploy(name, args, &program, &storage, space).await?;

        Ok(ContractHandle { client, url: url.clone(), payer, program, storage, abi })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs as stdfs,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use tempdir::TempDir;

    use super::*;

    struct StubRpc {
        airdrops: AtomicUsize,
    }

    #[async_trait]
    impl ChainRpc for StubRpc {
        async fn request_airdrop(&self, _address: &str, lamports: u64) -> Result<String> {
            assert_eq!(lamports, LAMPORTS_PER_SOL);
            self.airdrops.fetch_add(1, Ordering::SeqCst);
            Ok("signature".to_string())
        }

        async fn confirm_transaction(&self, signature: &str) -> Result<()> {
            assert_eq!(signature, "signature");
            Ok(())
        }
    }

    struct StubLoader {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl ProgramLoader for StubLoader {
        async fn load(
            &self,
            _payer: &SmithKeypair,
            _program: &SmithKeypair,
            bytecode: &[u8],
        ) -> Result<()> {
            assert!(!bytecode.is_empty());
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct StubContract {
        deploys: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ContractClient for StubContract {
        async fn deploy(
            &self,
            constructor: &str,
            _args: &[JsonValue],
            _program: &SmithKeypair,
            _storage: &SmithKeypair,
            space: u64,
        ) -> Result<()> {
            assert_eq!(constructor, "new");
            assert_eq!(space, DEFAULT_STORAGE_SPACE);
            self.deploys.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct StubFactory {
        deploys: Arc<AtomicUsize>,
    }

    impl ContractFactory for StubFactory {
        fn contract(
            &self,
            _url: &Url,
            _program: &SmithKeypair,
            _storage: &SmithKeypair,
            abi: &JsonValue,
            _payer: &SmithKeypair,
        ) -> Result<Box<dyn ContractClient>> {
            assert!(abi.get::<Vec<JsonValue>>().is_some());
            Ok(Box::new(StubContract { deploys: self.deploys.clone() }))
        }
    }

    fn fixture(tmp: &TempDir, deploys: Arc<AtomicUsize>) -> (LocalEnv, ProjectPaths) {
        let paths = ProjectPaths {
            sources: tmp.path().join("contracts"),
            artifacts: tmp.path().join("artifacts"),
            tests: tmp.path().join("test"),
        };
        stdfs::create_dir_all(&paths.artifacts).unwrap();
        stdfs::create_dir_all(&paths.tests).unwrap();
        stdfs::write(paths.artifacts.join(BUNDLE_FILE), b"\x7fELF-ish").unwrap();
        stdfs::write(paths.artifacts.join("counter.abi"), r#"[{"type":"constructor"}]"#)
            .unwrap();

        let env = LocalEnv::new(
            paths.clone(),
            Arc::new(StubRpc { airdrops: AtomicUsize::new(0) }),
            Arc::new(StubLoader { loads: AtomicUsize::new(0) }),
            Arc::new(StubFactory { deploys }),
        );

        (env, paths)
    }

    #[test]
    fn setup_runs_once_across_contract_calls() {
        smol::block_on(async {
            let tmp = TempDir::new("bootstrap").unwrap();
            let deploys = Arc::new(AtomicUsize::new(0));
            let (env, paths) = fixture(&tmp, deploys.clone());

            assert!(!env.is_bootstrapped().await);

            let first = env.contract("new", "counter.abi", &[]).await.unwrap();
            let second = env.contract("new", "counter.abi", &[]).await.unwrap();

            assert!(env.is_bootstrapped().await);
            assert_eq!(deploys.load(Ordering::SeqCst), 2);

            // Both handles resolved the same persisted identities but fresh
            // storage accounts.
            assert_eq!(first.program.address(), second.program.address());
            assert_eq!(first.payer.address(), second.payer.address());
            assert_ne!(first.storage.address(), second.storage.address());

            assert!(paths.tests.join(PAYER_KEY_FILE).exists());
            assert!(paths.tests.join(PROGRAM_KEY_FILE).exists());
        });
    }

    #[test]
    fn missing_abi_aborts_the_instantiation() {
        smol::block_on(async {
            let tmp = TempDir::new("bootstrap").unwrap();
            let deploys = Arc::new(AtomicUsize::new(0));
            let (env, _) = fixture(&tmp, deploys.clone());

            let result = env.contract("new", "nope.abi", &[]).await;
            assert!(matches!(result, Err(Error::AbiLoadError(_))));
            assert_eq!(deploys.load(Ordering::SeqCst), 0);
        });
    }

    #[test]
    fn missing_bundle_fails_the_setup() {
        smol::block_on(async {
            let tmp = TempDir::new("bootstrap").unwrap();
            let deploys = Arc::new(AtomicUsize::new(0));
            let (env, paths) = fixture(&tmp, deploys);
            stdfs::remove_file(paths.artifacts.join(BUNDLE_FILE)).unwrap();

            assert!(env.contract("new", "counter.abi", &[]).await.is_err());
            assert!(!env.is_bootstrapped().await);
        });
    }
}
