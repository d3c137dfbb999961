//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::cli::DownloadFormat;

/// TOML-backed file configuration for downloader defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Default output directory for artifacts.
    pub output_dir: Option<PathBuf>,
    /// Default image region token.
    pub region: Option<String>,
    /// Default image size token.
    pub size: Option<String>,
    /// Default rotation token.
    pub rotation: Option<String>,
    /// Default image quality token.
    pub quality: Option<String>,
    /// Default image format extension.
    pub format: Option<String>,
    /// Default output container.
    pub download_format: Option<DownloadFormat>,
    /// Default concurrency (same range as CLI).
    pub concurrency: Option<u8>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
    /// Optional HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Optional HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=32).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=32");
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        for (field, value) in [
            ("region", &self.region),
            ("size", &self.size),
            ("rotation", &self.rotation),
            ("quality", &self.quality),
            ("format", &self.format),
        ] {
            if value.as_deref().is_some_and(|token| token.trim().is_empty()) {
                bail!("Invalid config value for `{field}`: must not be empty");
            }
        }

        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/iiif-downloader/config.toml`
/// 2. `$HOME/.config/iiif-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("iiif-downloader")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("iiif-downloader")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_number = line_index + 1;
        let invalid = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "region" => cfg.region = Some(parse_string_literal(value).with_context(invalid)?),
            "size" => cfg.size = Some(parse_string_literal(value).with_context(invalid)?),
            "rotation" => {
                cfg.rotation = Some(parse_string_or_integer(value).with_context(invalid)?);
            }
            "quality" => cfg.quality = Some(parse_string_literal(value).with_context(invalid)?),
            "format" => cfg.format = Some(parse_string_literal(value).with_context(invalid)?),
            "download_format" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.download_format = Some(DownloadFormat::from_token(&parsed).with_context(
                    || {
                        format!(
                            "Invalid `download_format` value '{parsed}' on line {line_number}: expected one of: zip, pdf"
                        )
                    },
                )?);
            }
            "concurrency" => {
                cfg.concurrency = Some(parse_integer_u8(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

/// Rotation reads naturally as a bare number, so accept both forms.
fn parse_string_or_integer(raw_value: &str) -> Result<String> {
    if raw_value.starts_with('"') {
        return parse_string_literal(raw_value);
    }
    let value = raw_value.trim().parse::<i64>()?;
    Ok(value.to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
concurrency = 8
verbosity = "verbose"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.concurrency, Some(8));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert!(cfg.output_dir.is_none());
        assert!(cfg.region.is_none());
    }

    #[test]
    fn test_parse_config_transform_tokens() {
        let cfg = parse_config_str(
            r#"
region = "square"
size = "max"
rotation = 90
quality = "gray"
format = "png"
download_format = "pdf"
output_dir = "/srv/iiif"
"#,
        )
        .expect("transform config should parse");
        assert_eq!(cfg.region.as_deref(), Some("square"));
        assert_eq!(cfg.size.as_deref(), Some("max"));
        assert_eq!(cfg.rotation.as_deref(), Some("90"));
        assert_eq!(cfg.quality.as_deref(), Some("gray"));
        assert_eq!(cfg.format.as_deref(), Some("png"));
        assert_eq!(cfg.download_format, Some(DownloadFormat::Pdf));
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/srv/iiif")));
    }

    #[test]
    fn test_parse_config_quoted_mirrored_rotation() {
        let cfg = parse_config_str(r#"rotation = "!180""#).expect("quoted rotation should parse");
        assert_eq!(cfg.rotation.as_deref(), Some("!180"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_download_format() {
        let err = parse_config_str(r#"download_format = "tar""#)
            .expect_err("unknown container expected");
        assert!(err.to_string().contains("download_format"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_concurrency() {
        for raw in ["concurrency = 0", "concurrency = 33"] {
            let err = parse_config_str(raw).expect_err("invalid concurrency expected");
            assert!(
                err.to_string().contains("concurrency"),
                "expected concurrency validation error"
            );
        }
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("concurrency = 4 trailing")
            .expect_err("expected trailing token error");
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = parse_config_str("region = full").expect_err("expected quoting error");
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn test_parse_config_rejects_empty_token() {
        let err = parse_config_str(r#"size = "  ""#).expect_err("expected empty token error");
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
concurrency = 4 # workers
verbosity = "quiet" # preferred noise level
format = "jpg#1" # hash inside a string is kept
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.concurrency, Some(4));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Quiet));
        assert_eq!(cfg.format.as_deref(), Some("jpg#1"));
    }

    #[test]
    fn test_verbosity_as_str() {
        assert_eq!(VerbositySetting::Default.as_str(), "default");
        assert_eq!(VerbositySetting::Verbose.as_str(), "verbose");
        assert_eq!(VerbositySetting::Quiet.as_str(), "quiet");
        assert_eq!(VerbositySetting::Debug.as_str(), "debug");
    }

    #[test]
    fn test_parse_config_timeout_fields() {
        let cfg = parse_config_str(
            r#"
connect_timeout_secs = 15
read_timeout_secs = 120
"#,
        )
        .expect("timeout config should parse");
        assert_eq!(cfg.connect_timeout_secs, Some(15));
        assert_eq!(cfg.read_timeout_secs, Some(120));
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err =
            parse_config_str("read_timeout_secs = 3601").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("concurrency 4").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("unknown_key = 123").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("unknown_key"));
    }
}
