// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use stockcheck_app::{Manifest, NewRow, Quantity};

const STORES: [&str; 6] = [
    "Downtown",
    "Harbor",
    "Lakeside",
    "Midtown",
    "Northgate",
    "Riverside",
];

const PRODUCTS: [&str; 16] = [
    "Basmati Rice 5kg",
    "Olive Oil 1L",
    "Whole Milk 2L",
    "Rolled Oats 1kg",
    "Tomato Passata",
    "Sparkling Water 6pk",
    "Dark Chocolate 100g",
    "Free Range Eggs 12",
    "Greek Yogurt 500g",
    "Penne Pasta 500g",
    "Black Tea 80ct",
    "Almond Butter",
    "Frozen Peas 1kg",
    "Cheddar Block 400g",
    "Dish Soap 750ml",
    "Paper Towels 4pk",
];

const UNIT_TAGS: [&str; 10] = [
    "each", "case", "pack", "chilled", "frozen", "fragile", "bulk", "promo", "organic", "heavy",
];

const RACK_PREFIXES: [&str; 5] = ["A", "B", "C", "Cold", "Dry"];

const REMARKS: [&str; 5] = [
    "short delivery",
    "damaged packaging",
    "wrong variant",
    "expired stock",
    "over delivered",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Generates reproducible product manifests for tests and demos.
#[derive(Debug, Clone)]
pub struct ManifestFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl ManifestFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn store(&mut self) -> &'static str {
        self.pick(&STORES)
    }

    pub fn row_for_store(&mut self, store: &str) -> NewRow {
        let planned = self.int_n(48) + 1;
        let received = if self.int_n(12) == 0 {
            Quantity::Blank
        } else if self.rng.bool() {
            Quantity::Count(planned as f64)
        } else {
            Quantity::Count(planned.saturating_sub(self.int_n(planned + 1)) as f64)
        };

        let tag_count = self.int_n(3) + 1;
        let mut tags: Vec<String> = Vec::with_capacity(tag_count);
        while tags.len() < tag_count {
            let tag = self.pick(&UNIT_TAGS).to_owned();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let remark = if self.int_n(4) == 0 {
            self.pick(&REMARKS).to_owned()
        } else {
            String::new()
        };

        NewRow {
            store: store.to_owned(),
            product: self.pick(&PRODUCTS).to_owned(),
            planned_qty: Quantity::Count(planned as f64),
            received_qty: received,
            unit_tags: tags,
            rack_name: format!("{}-{:02}", self.pick(&RACK_PREFIXES), self.int_n(40) + 1),
            remark,
        }
    }

    /// Interleaves rows of `store_count` stores so filtering has to preserve order.
    pub fn manifest(&mut self, store_count: usize, rows: usize) -> Manifest {
        let store_count = store_count.clamp(1, STORES.len());
        let stores = &STORES[..store_count];
        let generated = (0..rows)
            .map(|_| {
                let store = stores[self.int_n(stores.len())];
                self.row_for_store(store)
            })
            .collect::<Vec<_>>();
        Manifest::from_rows(generated)
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }
}

pub fn product_row(store: &str, product: &str, planned: f64, received: f64) -> NewRow {
    NewRow {
        store: store.to_owned(),
        product: product.to_owned(),
        planned_qty: planned.into(),
        received_qty: received.into(),
        unit_tags: vec!["each".to_owned()],
        rack_name: "A-01".to_owned(),
        remark: String::new(),
    }
}

/// Store "A" with rows 0 and 1, store "B" with row 2.
pub fn sample_manifest() -> Manifest {
    Manifest::from_rows([
        NewRow {
            unit_tags: vec!["red".to_owned(), "blue".to_owned(), "green".to_owned()],
            rack_name: "Dry-04".to_owned(),
            ..product_row("A", "Rolled Oats 1kg", 12.0, 12.0)
        },
        NewRow {
            remark: "label torn".to_owned(),
            ..product_row("A", "Olive Oil 1L", 6.0, 5.0)
        },
        product_row("B", "Whole Milk 2L", 24.0, 24.0),
    ])
}

pub fn temp_sheet_path(file_name: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join(file_name);
    Ok((dir, path))
}

pub fn store_names() -> &'static [&'static str] {
    &STORES
}
