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

/// CLI utilities (logger setup, config spawning)
pub mod cli;

/// Filesystem utilities
pub mod file;

/// Filesystem path utilities
pub mod path;

pub use file::{collect_files, load_file, load_json_file, save_file};
pub use path::{expand_path, get_config_path, join_config_path};
