//! Input file discovery

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extension of sentence logs, matched case-insensitively
pub const NMEA_EXTENSION: &str = "nmea";

/// Sentence logs directly inside `dir`, sorted case-insensitively by file name
pub fn nmea_files_in<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if is_nmea_file(&path) {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|path| sort_key(path));
    Ok(files)
}

pub fn is_nmea_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(NMEA_EXTENSION))
}

fn sort_key(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    // Exact name breaks ties between names differing only in case
    (name.to_lowercase(), name)
}
