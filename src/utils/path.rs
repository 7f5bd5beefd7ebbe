//! Path utilities for output naming

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Characters that are invalid in file names on at least one supported platform
const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest title kept in a generated file name
const MAX_TITLE_CHARS: usize = 180;

/// Path utilities for output file naming
pub struct PathUtils;

impl PathUtils {
    /// Turn a free-form media title into a safe file stem
    pub fn sanitize_file_name(title: &str) -> String {
        let cleaned: String = title
            .chars()
            .map(|c| {
                if INVALID_CHARS.contains(&c) || c.is_control() {
                    '_'
                } else {
                    c
                }
            })
            .take(MAX_TITLE_CHARS)
            .collect();
        let trimmed = cleaned.trim().trim_matches('.').trim();
        if trimmed.is_empty() {
            "media".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// File stem (name without extension)
    pub fn stem(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string())
    }

    /// Lowercased extension without the dot
    pub fn extension(path: &Path) -> Option<String> {
        path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Append a suffix to the full file name: `a.mp4` + `.bak` -> `a.mp4.bak`
    pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
        let mut name: OsString = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        path.with_file_name(name)
    }

    /// `dir/name.ext` -> `dir/name (n).ext`
    pub fn numbered_variant(path: &Path, n: u64) -> PathBuf {
        let stem = Self::stem(path);
        let name = match path.extension() {
            Some(ext) => format!("{} ({}).{}", stem, n, ext.to_string_lossy()),
            None => format!("{} ({})", stem, n),
        };
        path.with_file_name(name)
    }

    /// First `name (n).ext` that does not exist yet, counting from 1
    pub fn unique_variant(path: &Path) -> PathBuf {
        let mut n: u64 = 1;
        loop {
            let candidate = Self::numbered_variant(path, n);
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}
