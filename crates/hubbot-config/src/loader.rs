// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Ordered list of config file locations searched from lowest to highest priority.
/// Later files override earlier ones.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("/etc/hubbot/config.toml"));

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/hubbot/config.toml"));
    }
    if let Some(cfg) = dirs::config_dir() {
        let p = cfg.join("hubbot/config.toml");
        if !paths.contains(&p) {
            paths.push(p);
        }
    }

    paths.push(PathBuf::from(".hubbot/config.toml"));
    paths.push(PathBuf::from("hubbot.toml"));

    paths
}

/// Load configuration by merging all discovered TOML files.
/// The `extra` argument may provide an explicit path (e.g. `--config` CLI flag).
///
/// Required environment values are not applied here; see
/// [`Config::apply_env`].
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    let mut layers: Vec<PathBuf> = config_search_paths()
        .into_iter()
        .filter(|p| p.is_file())
        .collect();
    if let Some(p) = extra {
        layers.push(p.to_path_buf());
    }
    load_layers(&layers)
}

fn load_layers(paths: &[PathBuf]) -> anyhow::Result<Config> {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in paths {
        debug!(path = %path.display(), "loading config layer");
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let layer: toml::Value = toml::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        merge_toml(&mut merged, layer);
    }

    let config: Config = merged.try_into().context("invalid configuration")?;
    Ok(config)
}

/// Deep-merge `src` into `dst`; src wins on scalar conflicts.
fn merge_toml(dst: &mut toml::Value, src: toml::Value) {
    match (dst, src) {
        (toml::Value::Table(d), toml::Value::Table(s)) => {
            for (k, v) in s {
                match d.get_mut(&k) {
                    Some(existing) => merge_toml(existing, v),
                    None => {
                        d.insert(k, v);
                    }
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
