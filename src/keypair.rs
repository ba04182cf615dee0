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

//! Ed25519 keypairs persisted as plain-text key files. The on-disk format is
//! the secret key bytes rendered as comma-separated decimals; the key file is
//! the sole durable representation, memory copies are rebuilt from it.

use std::path::Path;

use ed25519_compact::{KeyPair, PublicKey, SecretKey};
use smol::fs;

use crate::{Error, Result};

pub struct SmithKeypair {
    pair: KeyPair,
}

impl SmithKeypair {
    pub fn generate() -> Self {
        Self { pair: KeyPair::generate() }
    }

    pub fn public(&self) -> &PublicKey {
        &self.pair.pk
    }

    /// Base58 rendering of the public key, the address form the external
    /// CLIs and the RPC endpoint expect.
    pub fn address(&self) -> String {
        bs58::encode(self.pair.pk.as_ref()).into_string()
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let rendered =
            self.pair.sk.iter().map(|byte| byte.to_string()).collect::<Vec<_>>().join(",");

        fs::write(path, rendered)
            .await
            .map_err(|e| Error::KeyFileError(format!("{}: {}", path.display(), e)))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| Error::KeyFileError(format!("{}: {}", path.display(), e)))?;

        let mut bytes = Vec::with_capacity(SecretKey::BYTES);
        for token in contents.trim().split(',') {
            let byte = token
                .trim()
                .parse::<u8>()
                .map_err(|_| Error::KeyFileError(format!("bad byte in {}", path.display())))?;
            bytes.push(byte);
        }

        let sk = SecretKey::from_slice(&bytes)
            .map_err(|e| Error::KeyFileError(format!("{}: {}", path.display(), e)))?;
        let pk = sk.public_key();

        Ok(Self { pair: KeyPair { pk, sk } })
    }
}
