//! One command-line run: configure, download, save.

use std::io::{self, IsTerminal};
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use iiif_downloader_core::{
    BatchController, BatchOptions, BatchRequest, HttpClient, RangeRequest, TransformParameters,
};
use tracing::{debug, info};

use crate::ProcessExit;
use crate::app::{config_runtime, progress_manager, terminal};
use crate::app_config::load_default_file_config;
use crate::cli::Args;

pub(crate) async fn run_downloader() -> Result<ProcessExit> {
    let (cli_args, cli_sources) = config_runtime::parse_cli_with_sources();

    let loaded_config = load_default_file_config()?;
    let args = config_runtime::apply_config_defaults(
        cli_args,
        &cli_sources,
        loaded_config.config.as_ref(),
    )?;
    let http_timeouts = config_runtime::resolve_http_timeouts(loaded_config.config.as_ref());

    let default_level = config_runtime::resolve_default_log_level(&args);
    terminal::init_tracing(default_level, terminal::no_color_env_requested());

    debug!(?args, "CLI arguments parsed");
    if loaded_config.config.is_some()
        && let Some(path) = &loaded_config.path
    {
        debug!(path = %path.display(), "config file loaded");
    }
    info!(manifest = %args.manifest_url, "IIIF downloader starting");

    let client = HttpClient::new_with_timeouts(http_timeouts.connect_secs, http_timeouts.read_secs);
    let controller = BatchController::new(
        client,
        BatchOptions {
            concurrency: usize::from(args.concurrency),
        },
    )?;
    let request = build_request(&args);

    let use_spinner = terminal::should_use_spinner(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
        args.no_progress,
    );
    let (spinner, stop) = progress_manager::spawn_progress_ui(use_spinner, controller.progress());

    let result = controller.run(&request).await;

    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = spinner {
        let _ = handle.await;
    }

    let report = result.context("Download failed")?;

    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                args.output_dir.display()
            )
        })?;
    let path = report
        .artifact
        .save_to_dir(&args.output_dir)
        .await
        .with_context(|| format!("Failed to write artifact into '{}'", args.output_dir.display()))?;

    println!("{}", path.display());
    Ok(ProcessExit::Success)
}

/// Builds the immutable request record from merged settings.
fn build_request(args: &Args) -> BatchRequest {
    BatchRequest::new(args.manifest_url.clone())
        .with_params(TransformParameters {
            region: args.region.clone(),
            size: args.size.clone(),
            rotation: args.rotation.clone(),
            quality: args.quality.clone(),
            format: args.format.clone(),
        })
        .with_range(RangeRequest::new(args.start, args.stop))
        .with_container(args.download_format.container())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use iiif_downloader_core::OutputContainer;

    use super::*;

    #[test]
    fn test_build_request_carries_all_settings() {
        let args = Args::try_parse_from([
            "iiif-downloader",
            "https://example.org/iiif/book1/manifest",
            "--size",
            "max",
            "--format",
            "png",
            "--start",
            "2",
            "--stop",
            "4",
            "--download-format",
            "pdf",
        ])
        .unwrap();

        let request = build_request(&args);
        assert_eq!(request.manifest_url, "https://example.org/iiif/book1/manifest");
        assert_eq!(request.params.size, "max");
        assert_eq!(request.params.format, "png");
        assert_eq!(request.params.region, "full");
        assert_eq!(request.range, RangeRequest::new(Some(2), Some(4)));
        assert_eq!(request.container, OutputContainer::Pdf);
    }
}
