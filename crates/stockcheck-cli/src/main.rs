// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::FileRuntime;
use std::env;
use std::path::PathBuf;
use stockcheck_app::{Manifest, SessionState};
use stockcheck_sheet::{load_manifest, validate_manifest_path};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `stockcheck --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let source = options
        .manifest_path
        .clone()
        .unwrap_or_else(|| config.source_path());
    validate_manifest_path(&source.to_string_lossy())?;
    let output = options
        .output_path
        .clone()
        .unwrap_or_else(|| config.output_path(&source));
    validate_manifest_path(&output.to_string_lossy())
        .context("invalid export path; pass --output <file>.xlsx")?;

    let log_path = logging::default_log_path()?;
    let _log_guard = logging::init(&log_path, &config.log_level())?;

    let manifest = load_manifest(&source).context("cannot start without a product manifest")?;

    if options.list_stores {
        print!("{}", store_summary(&manifest));
        return Ok(());
    }

    if options.check_only {
        println!(
            "{}: {} rows across {} stores; exports go to {}",
            source.display(),
            manifest.len(),
            manifest.stores().len(),
            output.display()
        );
        return Ok(());
    }

    let mut state = SessionState::new(manifest);
    let mut runtime = FileRuntime::new(output);
    tracing::info!(
        source = %source.display(),
        output = %runtime.output_path().display(),
        "session started"
    );
    stockcheck_tui::run_app(&mut state, &mut runtime)?;
    tracing::info!(
        reviewed = state.reviewed_rows(),
        exports = runtime.exports(),
        "session ended"
    );
    if state.reviewed_rows() > 0 && runtime.exports() == 0 {
        eprintln!(
            "note: remarks were not exported; press ctrl+s next time to write {}",
            runtime.output_path().display()
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    manifest_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    print_config_path: bool,
    print_example: bool,
    list_stores: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        manifest_path: None,
        output_path: None,
        print_config_path: false,
        print_example: false,
        list_stores: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--manifest" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--manifest requires an .xlsx file path"))?;
                options.manifest_path = Some(PathBuf::from(value.as_ref()));
            }
            "--output" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--output requires an .xlsx file path"))?;
                options.output_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--list-stores" => {
                options.list_stores = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn store_summary(manifest: &Manifest) -> String {
    manifest
        .stores()
        .into_iter()
        .map(|store| format!("{store}\t{}\n", manifest.store_row_count(store)))
        .collect()
}

fn print_help() {
    println!("stockcheck: check received products store by store");
    println!("  --config <path>          Use a specific config path");
    println!("  --manifest <path>        Product sheet to load (default ./products.xlsx)");
    println!("  --output <path>          Export path (default checked_products.xlsx beside the source)");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --list-stores            Print each store with its product count");
    println!("  --check                  Load config and manifest, then exit");
    println!("  --help                   Show this help");
}
