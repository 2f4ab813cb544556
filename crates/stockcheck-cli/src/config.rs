// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use stockcheck_sheet::{
    APP_NAME, DEFAULT_EXPORT_FILE, DEFAULT_SOURCE_FILE, default_export_path,
    validate_manifest_path,
};

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

pub const CONFIG_PATH_ENV: &str = "STOCKCHECK_CONFIG_PATH";
pub const MANIFEST_PATH_ENV: &str = "STOCKCHECK_MANIFEST_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub manifest: ManifestSection,
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub log: LogSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            manifest: ManifestSection::default(),
            export: ExportSection::default(),
            log: LogSection::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestSection {
    pub source_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportSection {
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    pub level: Option<String>,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [manifest], [export], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(source) = &self.manifest.source_path {
            validate_manifest_path(source)
                .with_context(|| format!("invalid manifest.source_path in {}", path.display()))?;
        }

        if let Some(output) = &self.export.output_path {
            validate_manifest_path(output)
                .with_context(|| format!("invalid export.output_path in {}", path.display()))?;
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            bail!(
                "log.level in {} must be one of {}, got {level:?}",
                path.display(),
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    /// Config value first, then `STOCKCHECK_MANIFEST_PATH`, then `products.xlsx` in the working directory.
    pub fn source_path(&self) -> PathBuf {
        if let Some(path) = &self.manifest.source_path {
            return PathBuf::from(path);
        }
        match env::var_os(MANIFEST_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_SOURCE_FILE),
        }
    }

    pub fn output_path(&self, source: &Path) -> PathBuf {
        match &self.export.output_path {
            Some(path) => PathBuf::from(path),
            None => default_export_path(source),
        }
    }

    pub fn log_level(&self) -> String {
        self.log
            .level
            .as_deref()
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_ascii_lowercase()
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# stockcheck config\n# Place this file at: {}\n\nversion = 1\n\n[manifest]\n# Optional. Defaults to ${MANIFEST_PATH_ENV}, then ./{DEFAULT_SOURCE_FILE}\n# source_path = \"/absolute/path/to/{DEFAULT_SOURCE_FILE}\"\n\n[export]\n# Optional. Defaults to {DEFAULT_EXPORT_FILE} next to the source sheet\n# output_path = \"/absolute/path/to/{DEFAULT_EXPORT_FILE}\"\n\n[log]\n# RUST_LOG takes precedence when set\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n",
            path.display(),
        )
    }
}
