// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use calamine::DataType;
use stockcheck_app::{Quantity, format_quantity};

/// Coerces any cell to text. Empty cells become the empty string.
pub fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(value) => value.clone(),
        DataType::Float(value) => format_quantity(*value),
        DataType::Int(value) => value.to_string(),
        DataType::Bool(value) => value.to_string(),
        DataType::DateTime(value) | DataType::Duration(value) => format_quantity(*value),
        DataType::DateTimeIso(value) | DataType::DurationIso(value) => value.clone(),
        DataType::Error(error) => format!("#{error:?}"),
    }
}

/// Numbers and numeric text become counts, blanks stay blank, anything else
/// is kept as trimmed text.
pub fn cell_quantity(cell: &DataType) -> Quantity {
    match cell {
        DataType::Float(value) => Quantity::Count(*value),
        DataType::Int(value) => Quantity::Count(*value as f64),
        DataType::Empty => Quantity::Blank,
        other => text_quantity(&cell_text(other)),
    }
}

fn text_quantity(raw: &str) -> Quantity {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Quantity::Blank;
    }
    match parse_quantity(trimmed) {
        Some(value) => Quantity::Count(value),
        None => Quantity::Text(trimmed.to_owned()),
    }
}

pub fn parse_quantity(input: &str) -> Option<f64> {
    input
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub fn is_blank_row(cells: &[DataType]) -> bool {
    cells.iter().all(|cell| match cell {
        DataType::Empty => true,
        DataType::String(value) => value.trim().is_empty(),
        _ => false,
    })
}
