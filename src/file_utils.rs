use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use regex::Regex;
use walkdir::WalkDir;

use crate::document::DocumentKind;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path for a student's export
    // @params: output_dir, student_name, suffix ("scores", "feedback"), extension
    pub fn output_path<P: AsRef<Path>>(
        output_dir: P,
        student_name: &str,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let mut file_name = Self::sanitize_file_stem(student_name);
        file_name.push('_');
        file_name.push_str(suffix);
        file_name.push('.');
        file_name.push_str(extension.trim_start_matches('.'));

        output_dir.as_ref().join(file_name)
    }

    // @returns: Name with every character outside [A-Za-z0-9 ._-] replaced by '_'
    pub fn sanitize_file_stem(name: &str) -> String {
        let trimmed = name.trim();
        let sanitized = match Regex::new(r"[^A-Za-z0-9 ._-]") {
            Ok(re) => re.replace_all(trimmed, "_").into_owned(),
            Err(_) => trimmed.to_string(),
        };

        // Never produce ".", ".." or an empty stem
        if sanitized.chars().all(|c| c == '.') {
            format!("_{}", sanitized)
        } else {
            sanitized
        }
    }

    /// Find submission documents (.docx, .txt) under a directory, sorted by path
    ///
    /// Word lock files and `*_feedback` outputs are left out.
    pub fn find_submissions<P: AsRef<Path>>(dir: P) -> std::io::Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.map_err(std::io::Error::other)?;
            let path = entry.path();

            if !path.is_file() || !DocumentKind::is_supported(path) {
                continue;
            }

            match Self::skip_reason(path) {
                Some(reason) => info!("Skipping {} ({})", path.display(), reason),
                None => result.push(path.to_path_buf()),
            }
        }

        result.sort();
        Ok(result)
    }

    // @returns: Why a supported document is not treated as a submission, if it isn't
    pub(crate) fn skip_reason(path: &Path) -> Option<&'static str> {
        let name = path.file_name()?.to_string_lossy();
        let stem = path.file_stem()?.to_string_lossy();

        // Word leaves "~$name.docx" owner files next to open documents
        if name.starts_with("~$") {
            Some("Word lock file")
        } else if stem.ends_with("_feedback") {
            Some("looks like a feedback file from a previous run")
        } else {
            None
        }
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> std::io::Result<String> {
        fs::read_to_string(path)
    }

    /// Write bytes to a file, creating parent directories
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }
        fs::write(path, content)
    }

    /// Write a string to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<()> {
        Self::write_bytes(path, content.as_bytes())
    }
}
