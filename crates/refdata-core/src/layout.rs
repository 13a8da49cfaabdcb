//! Canonical on-disk layout for the date-partitioned store.
//!
//! This module is the single source of truth for data file paths. All
//! readers and writers construct paths through [`StoreLayout`]; no
//! hardcoded path strings should exist outside this module.
//!
//! # Path Layout
//!
//! ```text
//! {root}/
//! └── {YYYY}/
//!     └── {MM}/
//!         └── {DD}/
//!             └── refdata/
//!                 └── refdata.db
//! ```
//!
//! All numeric segments are zero-padded (4/2/2 digits), so the directory
//! tree this service writes sorts identically as strings and as numbers.

use std::fs;
use std::path::{Path, PathBuf};

use crate::date::CalendarDate;

/// Subdirectory holding the data file within a day partition.
pub const DATA_SUBDIR: &str = "refdata";

/// File name of the data file within the [`DATA_SUBDIR`] directory.
pub const DATA_FILE: &str = "refdata.db";

/// Canonical path resolver and catalog scanner for one store root.
///
/// The root is injected at construction so tests can point an instance at
/// a temporary directory.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    /// Creates a layout rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the canonical data file path for a date.
    ///
    /// Pure and deterministic: the same date always yields a byte-identical
    /// path, and distinct dates always yield distinct paths.
    #[must_use]
    pub fn resolve(&self, date: &CalendarDate) -> PathBuf {
        self.root
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
            .join(format!("{:02}", date.day()))
            .join(DATA_SUBDIR)
            .join(DATA_FILE)
    }

    /// Scans the root directory for dates that have a data file on disk.
    ///
    /// The scan walks three levels (year, month, day), keeps only purely
    /// numeric directory names, and includes a date only when its
    /// `refdata/refdata.db` file exists. Results are in ascending calendar
    /// order. An absent or empty root yields an empty catalog; the scan
    /// itself never fails.
    #[must_use]
    pub fn scan_catalog(&self) -> Vec<CalendarDate> {
        let mut dates = Vec::new();
        for (year_name, year_dir) in numeric_subdirs(&self.root) {
            for (month_name, month_dir) in numeric_subdirs(&year_dir) {
                for (day_name, day_dir) in numeric_subdirs(&month_dir) {
                    if !day_dir.join(DATA_SUBDIR).join(DATA_FILE).is_file() {
                        continue;
                    }
                    match CalendarDate::from_segments(&year_name, &month_name, &day_name) {
                        Ok(date) => dates.push(date),
                        Err(err) => {
                            tracing::debug!(
                                year = %year_name,
                                month = %month_name,
                                day = %day_name,
                                error = %err,
                                "Skipping out-of-bounds directory during catalog scan"
                            );
                        }
                    }
                }
            }
        }
        dates.sort_unstable();
        dates
    }
}

/// Lists subdirectories of `dir` whose names are purely ASCII digits.
fn numeric_subdirs(dir: &Path) -> Vec<(String, PathBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<(String, PathBuf)> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
                Some((name, entry.path()))
            } else {
                None
            }
        })
        .collect();
    found.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    found
}
