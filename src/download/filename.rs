//! Naming for produced artifacts, archive entries, and their on-disk paths.

use std::path::{Component, Path, PathBuf};

use url::Url;

/// Name used when a manifest URL yields nothing usable.
const FALLBACK_BASE_NAME: &str = "manifest";

/// Derives the logical artifact name from the manifest URL.
///
/// The name is the second-to-last path segment, percent-decoded, so
/// `https://host/iiif/book1/manifest` becomes `book1`. A single-segment
/// path falls back to the host.
#[must_use]
pub fn artifact_base_name(manifest_url: &str) -> String {
    let Ok(parsed) = Url::parse(manifest_url) else {
        return FALLBACK_BASE_NAME.to_string();
    };

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(Iterator::collect)
        .unwrap_or_default();

    let candidate = if segments.len() >= 2 {
        Some(segments[segments.len() - 2].to_string())
    } else {
        parsed.host_str().map(str::to_string)
    };

    candidate
        .map(|raw| {
            urlencoding::decode(&raw)
                .map(std::borrow::Cow::into_owned)
                .unwrap_or(raw)
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_BASE_NAME.to_string())
}

/// Name of one page inside the archive: `"{base} {label}.{format}"`.
#[must_use]
pub fn archive_entry_name(base_name: &str, label: &str, format: &str) -> String {
    format!("{base_name} {label}.{format}")
}

/// File name suggested for the finished artifact.
#[must_use]
pub fn artifact_file_name(base_name: &str, extension: &str) -> String {
    format!("{base_name}.{extension}")
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

/// Resolves a unique file path, adding numeric suffix if file exists.
///
/// Example: `book1.zip`, then `book1_1.zip`, `book1_2.zip`, ...
#[must_use]
pub fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let filename = {
        let sanitized = sanitize_filename(filename);
        if sanitized.trim_matches('_').is_empty() {
            "download.bin".to_string()
        } else {
            sanitized
        }
    };
    let base_path = dir.join(&filename);

    if !base_path.exists() {
        return base_path;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename.as_str(), ""),
    };

    for i in 1..1000 {
        let new_path = dir.join(format!("{stem}_{i}{ext}"));
        if !new_path.exists() {
            return new_path;
        }
    }

    // Fallback (extremely unlikely)
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("{stem}_{timestamp}{ext}"))
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_base_name_uses_second_to_last_segment() {
        assert_eq!(
            artifact_base_name("https://example.org/iiif/book1/manifest"),
            "book1"
        );
        assert_eq!(
            artifact_base_name("https://example.org/iiif/book1/manifest.json"),
            "book1"
        );
    }

    #[test]
    fn test_artifact_base_name_trailing_slash_matches_split_semantics() {
        // "a/b/manifest/" splits into [.., "manifest", ""]; second-to-last is "manifest".
        assert_eq!(
            artifact_base_name("https://example.org/a/manifest/"),
            "manifest"
        );
    }

    #[test]
    fn test_artifact_base_name_percent_decodes() {
        assert_eq!(
            artifact_base_name("https://example.org/iiif/Codex%20Sinaiticus/manifest"),
            "Codex Sinaiticus"
        );
    }

    #[test]
    fn test_artifact_base_name_single_segment_uses_host() {
        assert_eq!(
            artifact_base_name("https://library.example.org/manifest.json"),
            "library.example.org"
        );
    }

    #[test]
    fn test_artifact_base_name_unparseable_falls_back() {
        assert_eq!(artifact_base_name("not a url"), "manifest");
    }

    #[test]
    fn test_archive_entry_name_format() {
        assert_eq!(archive_entry_name("book1", "f. 2r", "jpg"), "book1 f. 2r.jpg");
        assert_eq!(archive_entry_name("book1", "", "png"), "book1 .png");
    }

    #[test]
    fn test_artifact_file_name_format() {
        assert_eq!(artifact_file_name("book1", "pdf"), "book1.pdf");
    }

    #[test]
    fn test_sanitize_filename_removes_invalid_chars() {
        assert_eq!(sanitize_filename("file/name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file\\name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file:name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("book1.zip"), "book1.zip");
    }

    #[test]
    fn test_sanitize_filename_rewrites_dot_segments() {
        assert_eq!(sanitize_filename(".."), "__");
        assert_eq!(sanitize_filename(""), "_");
    }

    #[test]
    fn test_resolve_unique_path_no_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let path = resolve_unique_path(temp_dir.path(), "book1.zip");
        assert_eq!(path, temp_dir.path().join("book1.zip"));
    }

    #[test]
    fn test_resolve_unique_path_with_conflict() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("book1.zip"), b"existing").unwrap();
        std::fs::write(temp_dir.path().join("book1_1.zip"), b"existing").unwrap();

        let path = resolve_unique_path(temp_dir.path(), "book1.zip");
        assert_eq!(path, temp_dir.path().join("book1_2.zip"));
    }

    #[test]
    fn test_resolve_unique_path_stays_under_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = resolve_unique_path(temp_dir.path(), "../escape.pdf");
        assert!(path.starts_with(temp_dir.path()));
        assert_eq!(path.parent().unwrap(), temp_dir.path());
    }
}
