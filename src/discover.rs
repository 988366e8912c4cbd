use eyre::{Context, Result, eyre};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Collect the `.vcf` files to convert.
///
/// Folders are scanned non-recursively. Inputs are de-duplicated by canonical
/// path, and anything listed in `ignore` is dropped. Folder entries come first,
/// sorted by name, followed by explicit files in the order given.
pub fn collect_vcf_files(
    folders: &[PathBuf],
    files: &[PathBuf],
    ignore: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    for folder in folders {
        if !folder.is_dir() {
            return Err(eyre!(
                "Source path '{}' is not a directory.",
                folder.display()
            ));
        }
    }
    for file in files {
        if !file.exists() {
            return Err(eyre!("File '{}' does not exist.", file.display()));
        }
        if !file.is_file() {
            return Err(eyre!("Path '{}' is not a file.", file.display()));
        }
    }

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut collected: Vec<PathBuf> = Vec::new();

    for folder in folders {
        let mut found = scan_folder(folder)?;
        found.sort();
        let before = collected.len();
        let total = found.len();
        for path in found {
            if seen.insert(canonical(&path)) {
                collected.push(path);
            }
        }
        let new = collected.len() - before;
        if new < total {
            debug!(
                "Found {} VCF file(s) in '{}' ({} new, {} duplicates)",
                total,
                folder.display(),
                new,
                total - new
            );
        } else {
            debug!("Found {} VCF file(s) in '{}'", total, folder.display());
        }
    }

    for file in files {
        if !has_vcf_extension(file) {
            warn!("File '{}' does not have a .vcf extension.", file.display());
        }
        if seen.insert(canonical(file)) {
            debug!("Added individual file: '{}'", file.display());
            collected.push(file.clone());
        } else {
            debug!("Skipping duplicate file: '{}'", file.display());
        }
    }

    if !ignore.is_empty() {
        let ignored: HashSet<PathBuf> = ignore.iter().map(|p| canonical(p)).collect();
        let before = collected.len();
        collected.retain(|p| !ignored.contains(&canonical(p)));
        let dropped = before - collected.len();
        if dropped > 0 {
            debug!("Ignored {} file(s)", dropped);
        }
    }

    Ok(collected)
}

fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder)
        .wrap_err_with(|| format!("Failed to read directory: {}", folder.display()))?;
    Ok(entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_vcf_extension(p))
        .collect())
}

fn has_vcf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("vcf"))
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
