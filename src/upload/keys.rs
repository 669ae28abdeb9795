// ABOUTME: Destination key computation for uploaded files
// ABOUTME: Joins prefix, directory name and relative path with forward slashes

use std::path::Path;

/// Join key segments, skipping empty ones, and normalize to forward slashes
///
/// ```
/// # use opsglue::upload::keys::join_key;
/// assert_eq!(join_key(&["", "report.csv"]), "report.csv");
/// assert_eq!(join_key(&["backups/", "data", "a\\b.txt"]), "backups/data/a/b.txt");
/// ```
pub fn join_key(segments: &[&str]) -> String {
    let mut key = String::new();
    for segment in segments.iter().filter(|s| !s.is_empty()) {
        if !key.is_empty() && !key.ends_with('/') && !key.ends_with('\\') {
            key.push('/');
        }
        key.push_str(segment);
    }
    key.replace('\\', "/")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Base name of a directory, ignoring trailing separators and `.` components
pub fn top_dir_name(dir: &Path) -> String {
    let name = file_name(dir);
    if !name.is_empty() {
        return name;
    }
    // `.` or `foo/..` style paths: fall back to the canonical form
    dir.canonicalize()
        .map(|p| file_name(&p))
        .unwrap_or_default()
}

/// Key for a single-file upload: prefix + base file name
pub fn single_file_key(prefix: &str, local_file: &Path) -> String {
    join_key(&[prefix, &file_name(local_file)])
}

/// Key for a file inside an uploaded directory: prefix/top_dir/relative
pub fn directory_file_key(prefix: &str, top_dir: &str, relative: &Path) -> String {
    let relative = relative.to_string_lossy();
    join_key(&[prefix, top_dir, &relative])
}
