// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod validation;
pub mod writer;

use anyhow::{Context, bail};
use calamine::{DataType, Range, Reader, Xlsx, XlsxError};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use stockcheck_app::{Column, Manifest, NewRow, Quantity, parse_unit_tags};
use thiserror::Error;
use validation::{cell_quantity, cell_text, is_blank_row};

pub use writer::{Cell, SheetWriter, column_letters};

pub const APP_NAME: &str = "stockcheck";
pub const DEFAULT_SOURCE_FILE: &str = "products.xlsx";
pub const DEFAULT_EXPORT_FILE: &str = "checked_products.xlsx";
pub const EXPORT_SHEET_NAME: &str = "Products";

/// Width of a source sheet that predates the Remark column.
const WIDTH_WITHOUT_REMARK: usize = Column::ALL.len() - 1;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "manifest {} not found; place the product sheet there or pass --manifest",
        .path.display()
    )]
    Missing { path: PathBuf },
    #[error("read manifest {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("open workbook")]
    Workbook(#[from] XlsxError),
    #[error("workbook has no worksheets")]
    NoWorksheet,
    #[error("first worksheet has no header row")]
    EmptySheet,
    #[error(
        "expected 7 columns (Store, Product, Planned Quantity, Received Qty, Product Unit Tags, Rack Name, Remark), found {found}"
    )]
    ColumnCount { found: usize },
}

pub fn load_manifest(path: &Path) -> Result<Manifest, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest = manifest_from_bytes(&bytes)?;
    tracing::info!(
        path = %path.display(),
        rows = manifest.len(),
        stores = manifest.stores().len(),
        "manifest loaded"
    );
    Ok(manifest)
}

pub fn manifest_from_bytes(bytes: &[u8]) -> Result<Manifest, LoadError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;
    manifest_from_range(&range)
}

fn manifest_from_range(range: &Range<DataType>) -> Result<Manifest, LoadError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(LoadError::EmptySheet)?;

    let width = header.len();
    if width != Column::ALL.len() && width != WIDTH_WITHOUT_REMARK {
        return Err(LoadError::ColumnCount { found: width });
    }
    warn_on_header_mismatch(header);

    let parsed = rows
        .filter(|cells| !is_blank_row(cells))
        .map(parse_row)
        .collect::<Vec<_>>();
    Ok(Manifest::from_rows(parsed))
}

fn parse_row(cells: &[DataType]) -> NewRow {
    let text = |column: Column| {
        cells
            .get(column.index())
            .map(cell_text)
            .unwrap_or_default()
    };
    let quantity = |column: Column| {
        cells
            .get(column.index())
            .map(cell_quantity)
            .unwrap_or_default()
    };

    NewRow {
        // Store is the filter key; the other text cells are kept verbatim.
        store: text(Column::Store).trim().to_owned(),
        product: text(Column::Product),
        planned_qty: quantity(Column::PlannedQty),
        received_qty: quantity(Column::ReceivedQty),
        unit_tags: parse_unit_tags(&text(Column::UnitTags)),
        rack_name: text(Column::RackName),
        remark: text(Column::Remark),
    }
}

fn warn_on_header_mismatch(header: &[DataType]) {
    for (cell, column) in header.iter().zip(Column::ALL) {
        let found = cell_text(cell);
        if !found.trim().eq_ignore_ascii_case(column.header()) {
            tracing::warn!(
                expected = column.header(),
                found = %found,
                "header differs from the expected column; reading it positionally"
            );
        }
    }
}

/// Renders the whole manifest, every store and every remark, as an xlsx workbook.
pub fn serialize_manifest(manifest: &Manifest) -> anyhow::Result<Vec<u8>> {
    let mut writer = SheetWriter::new(EXPORT_SHEET_NAME);
    writer.push_row(Column::ALL.map(Column::header));
    for row in manifest.rows() {
        writer.push_row([
            Cell::from(row.store.as_str()),
            Cell::from(row.product.as_str()),
            quantity_cell(&row.planned_qty),
            quantity_cell(&row.received_qty),
            Cell::from(row.unit_tags_display()),
            Cell::from(row.rack_name.as_str()),
            Cell::from(row.remark.as_str()),
        ]);
    }
    writer.finish()
}

fn quantity_cell(quantity: &Quantity) -> Cell {
    match quantity {
        Quantity::Blank => Cell::Blank,
        Quantity::Count(value) => Cell::Number(*value),
        Quantity::Text(text) => Cell::from(text.as_str()),
    }
}

pub fn write_manifest(path: &Path, manifest: &Manifest) -> anyhow::Result<()> {
    let bytes = serialize_manifest(manifest)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create export directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write export {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = manifest.len(), "manifest exported");
    Ok(())
}

/// Export lands next to the source so both files stay together.
pub fn default_export_path(source: &Path) -> PathBuf {
    match source.parent() {
        Some(parent) => parent.join(DEFAULT_EXPORT_FILE),
        None => PathBuf::from(DEFAULT_EXPORT_FILE),
    }
}

pub fn validate_manifest_path(path: &str) -> anyhow::Result<()> {
    if path.trim().is_empty() {
        bail!("manifest path must not be empty");
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "manifest path {path:?} looks like a URI ({scheme}://); download the sheet and pass a filesystem path"
            );
        }
    }

    let is_xlsx = Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("xlsx"));
    if !is_xlsx {
        bail!("manifest path {path:?} must point to an .xlsx workbook");
    }

    Ok(())
}
