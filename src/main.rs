// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Dotflow CLI entrypoint.
//!
//! Reads a DSL or DOT file (or stdin with `-`) and writes SVG, or DOT with `--export-dot`.
//! Set `DOTFLOW_LOG` (e.g. `debug`) for diagnostics on stderr.

use std::error::Error;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use dotflow::format::{export_dot, ParseOptions};
use dotflow::layout::{layout_graph, Approximation, LayoutConfig};
use dotflow::pipeline::{parse_source, resolve_style, InputFormat, PipelineError};
use dotflow::render::{render_svg, Style};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DOTFLOW_LOG";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [OPTIONS] <input|->\n\nOptions:\n  --format <dsl|dot>      input format (default: by extension, .dot/.gv are DOT)\n  -o, --output <path>     write to a file instead of stdout\n  --theme <name>          built-in theme (default, dark, colorful, monochrome, blue, green)\n  --theme-file <json>     theme loaded from a JSON file\n  --layout-config <json>  layout settings loaded from a JSON file\n  --iterations <n>        simulation iteration budget\n  --seed <n>              seed for the initial placement\n  --barnes-hut <theta>    approximate repulsion with a quadtree\n  --export-dot            write DOT instead of SVG\n  --strict                reject edges to nodes that were not declared first\n\nWithout --theme/--theme-file the graph's `theme` attribute picks the theme.\nSet {LOG_ENV}=debug for diagnostics on stderr."
    );
}

#[derive(Debug, Default, Clone, PartialEq)]
struct CliOptions {
    input: Option<String>,
    format: Option<InputFormat>,
    output: Option<String>,
    theme: Option<String>,
    theme_file: Option<String>,
    layout_config: Option<String>,
    iterations: Option<usize>,
    seed: Option<u64>,
    barnes_hut: Option<f64>,
    export_dot: bool,
    strict: bool,
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> Result<(), ()> {
    if slot.is_some() {
        return Err(());
    }
    *slot = Some(value);
    Ok(())
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--format" => {
                let raw = args.next().ok_or(())?;
                set_once(&mut options.format, InputFormat::from_name(&raw).ok_or(())?)?;
            }
            "-o" | "--output" => set_once(&mut options.output, args.next().ok_or(())?)?,
            "--theme" => set_once(&mut options.theme, args.next().ok_or(())?)?,
            "--theme-file" => set_once(&mut options.theme_file, args.next().ok_or(())?)?,
            "--layout-config" => set_once(&mut options.layout_config, args.next().ok_or(())?)?,
            "--iterations" => {
                let raw = args.next().ok_or(())?;
                set_once(&mut options.iterations, raw.parse().map_err(|_| ())?)?;
            }
            "--seed" => {
                let raw = args.next().ok_or(())?;
                set_once(&mut options.seed, raw.parse().map_err(|_| ())?)?;
            }
            "--barnes-hut" => {
                let raw = args.next().ok_or(())?;
                let theta: f64 = raw.parse().map_err(|_| ())?;
                if !(theta.is_finite() && theta >= 0.0) {
                    return Err(());
                }
                set_once(&mut options.barnes_hut, theta)?;
            }
            "--export-dot" => {
                if options.export_dot {
                    return Err(());
                }
                options.export_dot = true;
            }
            "--strict" => {
                if options.strict {
                    return Err(());
                }
                options.strict = true;
            }
            "-" => set_once(&mut options.input, arg)?,
            _ if arg.starts_with('-') => return Err(()),
            _ => set_once(&mut options.input, arg)?,
        }
    }

    if options.input.is_none() {
        return Err(());
    }
    if options.theme.is_some() && options.theme_file.is_some() {
        return Err(());
    }

    Ok(options)
}

fn read_file(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path)
        .map_err(|source| PipelineError::Io { path: path.to_path_buf(), source })
}

fn read_input(input: &str) -> Result<String, PipelineError> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|source| PipelineError::Io { path: PathBuf::from("<stdin>"), source })?;
        return Ok(text);
    }
    read_file(Path::new(input))
}

fn layout_config(options: &CliOptions) -> Result<LayoutConfig, PipelineError> {
    let mut config = match &options.layout_config {
        Some(path) => LayoutConfig::from_json(&read_file(Path::new(path))?)?,
        None => LayoutConfig::default(),
    };
    if let Some(iterations) = options.iterations {
        config.iterations = iterations;
    }
    if let Some(seed) = options.seed {
        config.seed = Some(seed);
    }
    if let Some(theta) = options.barnes_hut {
        config.approximation = Approximation::BarnesHut { theta };
    }
    Ok(config)
}

fn explicit_style(options: &CliOptions) -> Result<Option<Style>, PipelineError> {
    if let Some(name) = &options.theme {
        return Ok(Some(Style::builtin(name)?));
    }
    if let Some(path) = &options.theme_file {
        return Ok(Some(Style::from_json(&read_file(Path::new(path))?)?));
    }
    Ok(None)
}

fn run(options: &CliOptions) -> Result<String, PipelineError> {
    let input = options.input.as_deref().unwrap_or("-");
    let format = options.format.unwrap_or_else(|| InputFormat::from_path(Path::new(input)));
    let text = read_input(input)?;
    let graph = parse_source(&text, format, ParseOptions { strict_references: options.strict })?;

    if options.export_dot {
        return Ok(export_dot(&graph));
    }

    let style = resolve_style(&graph, explicit_style(options)?.as_ref())?;
    let layout = layout_graph(&graph, &layout_config(options)?);
    tracing::debug!(
        seed = layout.seed(),
        iterations = layout.iterations_run(),
        converged = layout.converged(),
        "layout finished"
    );
    Ok(render_svg(&graph, &layout, &style)?)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    init_tracing();

    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "dotflow".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let document = run(&options)?;
        match &options.output {
            Some(path) => std::fs::write(path, document)
                .map_err(|source| PipelineError::Io { path: PathBuf::from(path), source })?,
            None => std::io::stdout().lock().write_all(document.as_bytes())?,
        }
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("dotflow: {err}");
        std::process::exit(1);
    }
}
