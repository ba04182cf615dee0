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

use std::path::{Path, PathBuf};

use smol::{fs, stream::StreamExt};
use tinyjson::JsonValue;

use crate::Result;

/// Dependency directory excluded from any recursive walk.
pub const DEPS_DIR: &str = "node_modules";

/// Recursion ceiling for directory walks.
pub const MAX_WALK_DEPTH: usize = 419;

pub async fn load_file(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path).await?)
}

pub async fn save_file(path: &Path, st: &str) -> Result<()> {
    fs::write(path, st).await?;
    Ok(())
}

pub async fn load_json_file(path: &Path) -> Result<JsonValue> {
    let st = load_file(path).await?;
    Ok(st.parse()?)
}

/// Recursively collect every file under `dir`, skipping directories named
/// [`DEPS_DIR`] and stopping at `depth` levels.
pub async fn collect_files(dir: &Path, depth: usize) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if depth == 0 {
        return Ok(files)
    }

    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.try_next().await? {
        let path = entry.path();

        if path.is_dir() {
            if path.file_name().is_some_and(|name| name == DEPS_DIR) {
                continue
            }
            files.append(&mut Box::pin(collect_files(&path, depth - 1)).await?);
        } else {
            files.push(path);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    #[test]
    fn walk_skips_dependency_dirs() {
        let tmp = TempDir::new("walk").unwrap();
        fs::create_dir_all(tmp.path().join("sub/node_modules/dep")).unwrap();
        fs::write(tmp.path().join("a.sol"), "contract A {}").unwrap();
        fs::write(tmp.path().join("sub/b.sol"), "contract B {}").unwrap();
        fs::write(tmp.path().join("sub/node_modules/dep/c.sol"), "contract C {}").unwrap();

        let mut found = smol::block_on(collect_files(tmp.path(), MAX_WALK_DEPTH)).unwrap();
        found.sort();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| !p.components().any(|c| c.as_os_str() == DEPS_DIR)));
    }
}
