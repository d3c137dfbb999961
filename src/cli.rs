//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use iiif_downloader_core::OutputContainer;
use iiif_downloader_core::batch::DEFAULT_CONCURRENCY;

/// Download the pages of an IIIF manifest as one zip or PDF.
///
/// Every page image is requested from its IIIF Image API service with the
/// given region/size/rotation/quality/format tokens.
#[derive(Parser, Debug, Clone)]
#[command(name = "iiif-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// IIIF presentation manifest URL
    #[arg(value_name = "MANIFEST_URL")]
    pub manifest_url: String,

    /// Image region (e.g. full, square, x,y,w,h)
    #[arg(long, default_value = "full")]
    pub region: String,

    /// Image size (e.g. full, max, 800,)
    #[arg(long, default_value = "full")]
    pub size: String,

    /// Rotation in degrees, `!` prefix mirrors
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub rotation: String,

    /// Image quality (default, color, gray, bitonal)
    #[arg(long, default_value = "default")]
    pub quality: String,

    /// Image format extension (jpg, png, ...)
    #[arg(long, default_value = "jpg")]
    pub format: String,

    /// First page to include, 1-based (out of range means the first page)
    #[arg(long, allow_negative_numbers = true)]
    pub start: Option<i64>,

    /// Last page to include, 1-based (out of range means the last page)
    #[arg(long, allow_negative_numbers = true)]
    pub stop: Option<i64>,

    /// Output container
    #[arg(long, value_enum, default_value_t = DownloadFormat::Zip)]
    pub download_format: DownloadFormat,

    /// Directory the artifact is written to
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum concurrent page fetches (1-32)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub concurrency: u8,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

/// Container choices accepted on the command line and in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DownloadFormat {
    /// Zip archive of page images
    Zip,
    /// Single PDF document
    Pdf,
}

impl DownloadFormat {
    /// Parses a config token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "zip" => Some(Self::Zip),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Library container for this choice.
    pub fn container(self) -> OutputContainer {
        match self {
            Self::Zip => OutputContainer::Zip,
            Self::Pdf => OutputContainer::Pdf,
        }
    }
}
