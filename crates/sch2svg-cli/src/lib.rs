//! CLI logic for the sch2svg tool.
//!
//! Renders one schematic from disk, reading its cache library from the same
//! directory, and writes the SVG next to wherever `--output` points.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use log::{info, warn};

use sch2svg::{CancelToken, RenderError, SchematicRenderer, source::FileSource};

/// Directory the input's documents are read from.
pub fn source_root(args: &Args) -> PathBuf {
    Path::new(&args.input)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Run the sch2svg CLI application
///
/// Loads the configuration, renders the input schematic and writes the
/// result to the output file.
///
/// # Errors
///
/// Returns `RenderError` for:
/// - Configuration loading errors
/// - Missing or unreadable input documents
/// - Malformed schematic or library documents
/// - Output file errors
pub fn run(args: &Args) -> Result<(), RenderError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing schematic"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    let render = args.apply_to(app_config.render().clone());
    *app_config.render_mut() = render;

    let input = Path::new(&args.input);
    let id = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| RenderError::Config(format!("`{}` does not name a file", args.input)))?;
    let source = FileSource::new(source_root(args));

    let renderer = SchematicRenderer::new(app_config)?;
    let out = BufWriter::new(File::create(&args.output)?);
    let summary = renderer.render(&source, &id, out, &CancelToken::new())?;

    if let Some(err) = summary.recovered() {
        warn!(error:% = err; "Output was closed early around a format error");
    }
    info!(
        output_file = args.output,
        symbols = summary.symbols_drawn(),
        unresolved = summary.unresolved().len();
        "SVG exported successfully"
    );

    Ok(())
}
