// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use stockcheck_app::Manifest;
use stockcheck_sheet::write_manifest;

/// Writes exports to one fixed workbook path, replacing it each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRuntime {
    output_path: PathBuf,
    exports: usize,
}

impl FileRuntime {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            exports: 0,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn exports(&self) -> usize {
        self.exports
    }
}

impl stockcheck_tui::SessionRuntime for FileRuntime {
    fn export_manifest(&mut self, manifest: &Manifest) -> Result<PathBuf> {
        write_manifest(&self.output_path, manifest).with_context(|| {
            format!(
                "export to {} -- set [export].output_path or pass --output to change it",
                self.output_path.display()
            )
        })?;
        self.exports += 1;
        Ok(self.output_path.clone())
    }
}
