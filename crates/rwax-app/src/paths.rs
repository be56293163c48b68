// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config location.

use std::path::PathBuf;

const APP_DIR: &str = "rwax";
const CONFIG_FILE: &str = "config.json";

/// Where `rwax` looks for its config when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    config_base().join(APP_DIR).join(CONFIG_FILE)
}

fn config_base() -> PathBuf {
    // XDG first, then the conventional dot directory.
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg);
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from(".")
}
