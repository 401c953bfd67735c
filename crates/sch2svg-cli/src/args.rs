//! Command-line argument definitions for the sch2svg CLI.
//!
//! Arguments select the input schematic, the output file, the configuration
//! file and the log level. The remaining flags override single options of
//! the `[render]` configuration section.

use clap::{ArgGroup, Parser};

use sch2svg::config::{HiddenPins, RenderConfig};

/// Render an EESchema schematic and its cache library to SVG
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("hidden").args(["show_hidden_pins", "hidden_pins_if_connected"])))]
pub struct Args {
    /// Path to the input schematic (`.sch`)
    #[arg(help = "Path to the input schematic")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write a `class` attribute on every element
    #[arg(long)]
    pub css_classes: bool,

    /// Indent the SVG output
    #[arg(long)]
    pub pretty: bool,

    /// Draw pins marked invisible in the library
    #[arg(long)]
    pub show_hidden_pins: bool,

    /// Draw invisible pins only where a wire ends on them
    #[arg(long)]
    pub hidden_pins_if_connected: bool,

    /// Leave pin numbers out
    #[arg(long)]
    pub no_pin_numbers: bool,

    /// Close the document around a format error instead of failing
    #[arg(long)]
    pub annotate_errors: bool,
}

impl Args {
    /// Applies the flags that were given on top of `config`.
    pub fn apply_to(&self, mut config: RenderConfig) -> RenderConfig {
        if self.css_classes {
            config = config.with_css_classes(true);
        }
        if self.pretty {
            config = config.with_pretty(true);
        }
        if self.show_hidden_pins {
            config = config.with_hidden_pins(HiddenPins::Show);
        }
        if self.hidden_pins_if_connected {
            config = config.with_hidden_pins(HiddenPins::ShowIfWireConnected);
        }
        if self.no_pin_numbers {
            config = config.with_pin_numbers(false);
        }
        if self.annotate_errors {
            config = config.with_annotate_errors(true);
        }
        config
    }
}
