//! Merging command-line values over file config, and the derived runtime settings.

use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use iiif_downloader_core::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Which options were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) output_dir: bool,
    pub(crate) region: bool,
    pub(crate) size: bool,
    pub(crate) rotation: bool,
    pub(crate) quality: bool,
    pub(crate) format: bool,
    pub(crate) download_format: bool,
    pub(crate) concurrency: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HttpTimeoutSettings {
    pub(crate) connect_secs: u64,
    pub(crate) read_secs: u64,
}

impl Default for HttpTimeoutSettings {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    (args, cli_value_sources(&matches))
}

fn cli_value_sources(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output_dir: is_commandline_value(matches, "output_dir"),
        region: is_commandline_value(matches, "region"),
        size: is_commandline_value(matches, "size"),
        rotation: is_commandline_value(matches, "rotation"),
        quality: is_commandline_value(matches, "quality"),
        format: is_commandline_value(matches, "format"),
        download_format: is_commandline_value(matches, "download_format"),
        concurrency: is_commandline_value(matches, "concurrency"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

fn apply_token(target: &mut String, given_on_cli: bool, from_file: Option<&String>) {
    if !given_on_cli && let Some(value) = from_file {
        target.clone_from(value);
    }
}

pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Args> {
    if let Some(file_config) = file_config {
        if !cli_sources.output_dir
            && let Some(output_dir) = &file_config.output_dir
        {
            args.output_dir.clone_from(output_dir);
        }

        apply_token(&mut args.region, cli_sources.region, file_config.region.as_ref());
        apply_token(&mut args.size, cli_sources.size, file_config.size.as_ref());
        apply_token(
            &mut args.rotation,
            cli_sources.rotation,
            file_config.rotation.as_ref(),
        );
        apply_token(
            &mut args.quality,
            cli_sources.quality,
            file_config.quality.as_ref(),
        );
        apply_token(&mut args.format, cli_sources.format, file_config.format.as_ref());

        if !cli_sources.download_format
            && let Some(download_format) = file_config.download_format
        {
            args.download_format = download_format;
        }

        if !cli_sources.concurrency
            && let Some(concurrency) = file_config.concurrency
        {
            args.concurrency = concurrency;
        }

        if !cli_sources.verbose
            && !cli_sources.quiet
            && let Some(verbosity) = file_config.verbosity
        {
            apply_config_verbosity(&mut args, verbosity);
        }
    }

    if !(1..=32).contains(&args.concurrency) {
        bail!(
            "Invalid effective concurrency value: {}. Expected range: 1..=32",
            args.concurrency
        );
    }

    Ok(args)
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    match verbosity {
        VerbositySetting::Default => {
            args.quiet = false;
            args.verbose = 0;
        }
        VerbositySetting::Verbose => {
            args.quiet = false;
            args.verbose = 1;
        }
        VerbositySetting::Quiet => {
            args.quiet = true;
            args.verbose = 0;
        }
        VerbositySetting::Debug => {
            args.quiet = false;
            args.verbose = 2;
        }
    }
}

pub(crate) fn resolve_http_timeouts(file_config: Option<&FileConfig>) -> HttpTimeoutSettings {
    let mut settings = HttpTimeoutSettings::default();
    let Some(file_config) = file_config else {
        return settings;
    };

    if let Some(value) = file_config.connect_timeout_secs {
        settings.connect_secs = value;
    }
    if let Some(value) = file_config.read_timeout_secs {
        settings.read_secs = value;
    }
    settings
}

/// Priority: quiet flag > verbose count > default (info). `RUST_LOG` still wins at init.
pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
