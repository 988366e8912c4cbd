use crate::config::{ConvertOptions, IdentifierValidation};
use crate::error::ConvertError;
use crate::filename::{derive_filename, find_existing_files_with_uid};
use crate::parallel;
use crate::reader::{is_valid_uuid, read_contact_file};
use crate::renderer::render_markdown;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    Created,
    Updated,
    /// The note was not older than its source and was left as is.
    Unchanged,
    Skipped,
    Failed,
}

impl ProcessResult {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            ProcessResult::Created | ProcessResult::Updated | ProcessResult::Unchanged
        )
    }
}

/// Converts single `.vcf` files into notes inside a destination directory.
///
/// Removing notes that share the contact's UID and writing the new note happen
/// under one lock, so workers sharing a `Converter` never interleave those
/// steps. Reading, parsing and rendering run unlocked.
pub struct Converter {
    options: ConvertOptions,
    write_lock: Mutex<()>,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            write_lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert one file, returning whether its note is now up to date.
    pub fn convert_one(&self, input: &Path, output_dir: &Path) -> bool {
        self.process(input, output_dir).is_success()
    }

    /// Convert every input independently. Returns `(successful, total)`.
    pub fn convert_many(&self, inputs: &[PathBuf], output_dir: &Path) -> (usize, usize) {
        let summary = parallel::execute(self, inputs, output_dir, |_, _| {});
        (summary.succeeded(), summary.total)
    }

    /// Convert one file and log the outcome. Errors never escape.
    pub fn process(&self, input: &Path, output_dir: &Path) -> ProcessResult {
        match self.try_convert(input, output_dir) {
            Ok(result) => result,
            Err(e) if e.is_skip() => {
                warn!("Skipped {}: {}", input.display(), e);
                ProcessResult::Skipped
            }
            Err(e) => {
                error!("Error converting {}: {}", input.display(), e);
                ProcessResult::Failed
            }
        }
    }

    pub fn try_convert(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<ProcessResult, ConvertError> {
        let contact = read_contact_file(input)?;

        if self.options.identifier_validation == IdentifierValidation::Strict
            && let Some(uid) = contact.identifier.as_deref()
            && !is_valid_uuid(uid)
        {
            return Err(ConvertError::IdentifierInvalid(uid.to_string()));
        }

        let stem = derive_filename(&contact, input);
        let desired_path = output_dir.join(format!("{}.md", stem));

        let content = render_markdown(&contact, &self.options.render_options());

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        // Stale notes left behind by an earlier failed cleanup are retried
        // even when the note itself is up to date.
        let mut removed = 0usize;
        if let Some(uid) = contact.identifier.as_deref() {
            removed = remove_stale_files(output_dir, uid, &desired_path);
        }

        if self.options.skip_unchanged && is_up_to_date(&desired_path, input) {
            info!("Unchanged: {}", desired_path.display());
            return Ok(ProcessResult::Unchanged);
        }

        let existed = desired_path.exists();
        fs::write(&desired_path, content).map_err(|source| ConvertError::Write {
            path: desired_path.clone(),
            source,
        })?;

        info!(
            "Converted: {} -> {}",
            file_name(input),
            file_name(&desired_path)
        );

        if existed || removed > 0 {
            Ok(ProcessResult::Updated)
        } else {
            Ok(ProcessResult::Created)
        }
    }
}

// Deletes notes with the same UID under a different name. Returns how many were removed.
// A note that cannot be removed is logged and left for the next run.
fn remove_stale_files(output_dir: &Path, uid: &str, desired_path: &Path) -> usize {
    let mut removed = 0;
    for old_path in find_existing_files_with_uid(output_dir, uid) {
        if old_path == desired_path {
            continue;
        }
        match fs::remove_file(&old_path) {
            Ok(()) => {
                removed += 1;
                info!("Removed old file: {}", file_name(&old_path));
            }
            Err(source) => {
                let err = ConvertError::StaleFileCleanup {
                    path: old_path,
                    source,
                };
                warn!("{}", err);
            }
        }
    }
    removed
}

fn is_up_to_date(target: &Path, source: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(target), modified(source)) {
        (Some(target_ts), Some(source_ts)) => target_ts >= source_ts,
        _ => false,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
