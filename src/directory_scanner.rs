// SPDX-License-Identifier: MPL-2.0
//! Directory scanner module for listing generated image files.
//!
//! This module lists the image files of an output directory, filters them to
//! the formats the generation pipeline writes, and sorts them by creation
//! time so that page slicing and selection indexing agree on one ordering.
//! It also computes the next sequential output filename for new generations.

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extensions the generation pipeline writes.
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Checks if a file has a supported image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Lists the image files in `directory`, sorted by creation time.
///
/// Files whose creation time the filesystem cannot report sort first (epoch
/// fallback); the file name breaks ties. The listing is live: callers see
/// files the generation pipeline added or removed since the last call.
pub fn list_image_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && is_image_file(&path) {
            image_files.push(path);
        }
    }

    sort_by_creation_time(&mut image_files);

    Ok(image_files)
}

/// Computes the next sequential output filename for `directory`.
///
/// Only `.png` files whose stem is a pure decimal number participate;
/// everything else is ignored. Returns `"1.png"` when no numbered file
/// exists, otherwise `"{highest + 1}.png"`.
pub fn next_output_filename(directory: &Path) -> Result<String> {
    let mut highest: Option<u64> = None;

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() || !has_extension(&path, "png") {
            continue;
        }

        if let Some(number) = numeric_stem(&path) {
            highest = Some(highest.map_or(number, |h| h.max(number)));
        }
    }

    Ok(format!("{}.png", highest.map_or(1, |h| h + 1)))
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

fn numeric_stem(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || !stem.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

fn sort_by_creation_time(image_files: &mut [PathBuf]) {
    image_files.sort_by(|a, b| {
        created_or_epoch(a)
            .cmp(&created_or_epoch(b))
            .then_with(|| a.file_name().cmp(&b.file_name()))
    });
}

fn created_or_epoch(path: &Path) -> SystemTime {
    path.metadata()
        .and_then(|m| m.created())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
