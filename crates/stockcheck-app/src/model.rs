// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ids::RowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Store,
    Product,
    PlannedQty,
    ReceivedQty,
    UnitTags,
    RackName,
    Remark,
}

impl Column {
    pub const ALL: [Self; 7] = [
        Self::Store,
        Self::Product,
        Self::PlannedQty,
        Self::ReceivedQty,
        Self::UnitTags,
        Self::RackName,
        Self::Remark,
    ];

    /// Header text written to exported sheets.
    pub const fn header(self) -> &'static str {
        match self {
            Self::Store => "Store",
            Self::Product => "Product",
            Self::PlannedQty => "Planned Quantity",
            Self::ReceivedQty => "Received Qty",
            Self::UnitTags => "Product Unit Tags",
            Self::RackName => "Rack Name",
            Self::Remark => "Remark",
        }
    }

    /// Zero-based position in the sheet layout.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A quantity cell as it appeared in the sheet. Blank and free-text cells
/// are kept so an export writes them back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Quantity {
    #[default]
    Blank,
    Count(f64),
    Text(String),
}

impl Quantity {
    pub fn count(&self) -> Option<f64> {
        match self {
            Self::Count(value) => Some(*value),
            Self::Blank | Self::Text(_) => None,
        }
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Self::Count(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => f.write_str("-"),
            Self::Count(value) => f.write_str(&format_quantity(*value)),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub store: String,
    pub product: String,
    pub planned_qty: Quantity,
    pub received_qty: Quantity,
    pub unit_tags: Vec<String>,
    pub rack_name: String,
    pub remark: String,
}

impl Row {
    /// Tags joined back into the single-cell form used by spreadsheets.
    pub fn unit_tags_display(&self) -> String {
        self.unit_tags.join(", ")
    }

    /// Received minus planned, when both cells hold numbers.
    pub fn quantity_gap(&self) -> Option<f64> {
        Some(self.received_qty.count()? - self.planned_qty.count()?)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewRow {
    pub store: String,
    pub product: String,
    pub planned_qty: Quantity,
    pub received_qty: Quantity,
    pub unit_tags: Vec<String>,
    pub rack_name: String,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("manifest has no row {0}")]
    RowNotFound(RowId),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Manifest {
    rows: Vec<Row>,
}

impl Manifest {
    pub fn from_rows(rows: impl IntoIterator<Item = NewRow>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(position, row)| Row {
                id: RowId::new(position),
                store: row.store,
                product: row.product,
                planned_qty: row.planned_qty,
                received_qty: row.received_qty,
                unit_tags: row.unit_tags,
                rack_name: row.rack_name,
                remark: row.remark,
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.get(id.get())
    }

    /// Distinct store names in order of first appearance.
    pub fn stores(&self) -> Vec<&str> {
        let mut stores: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !stores.contains(&row.store.as_str()) {
                stores.push(&row.store);
            }
        }
        stores
    }

    pub fn contains_store(&self, store: &str) -> bool {
        self.rows.iter().any(|row| row.store == store)
    }

    /// Rows of one store in manifest order. Recomputed on every call.
    pub fn rows_for_store<'a>(&'a self, store: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows.iter().filter(move |row| row.store == store)
    }

    pub fn store_row_count(&self, store: &str) -> usize {
        self.rows_for_store(store).count()
    }

    /// Overwrites the remark of `id` whatever it held before.
    pub fn update_remark(&mut self, id: RowId, text: impl Into<String>) -> Result<(), ManifestError> {
        let row = self
            .rows
            .get_mut(id.get())
            .ok_or(ManifestError::RowNotFound(id))?;
        row.remark = text.into();
        Ok(())
    }
}

/// Splits a comma-delimited tag cell, trimming each token and dropping blanks.
pub fn parse_unit_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn format_quantity(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
