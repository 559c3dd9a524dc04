use glob::{MatchOptions, Pattern};
use regex::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Parcel files named like `Parcela 12.shp` are processed in numeric order.
const PARCEL_NUMBER: &str = r"(?i)Parcela\s*(\d+)\.shp";

/// Every shapefile directly inside `dir`, in processing order: numbered parcels by number,
/// then the remaining files by name.
pub fn discover_parcels(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PipelineError::InputNotFound(dir.to_path_buf()));
    }

    let pattern = format!(
        "{}/*.shp",
        Pattern::escape(&dir.to_string_lossy()).trim_end_matches('/')
    );
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut parcels = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        match entry {
            Ok(path) if path.is_file() => parcels.push(path),
            Ok(_) => {}
            Err(err) => log::warn!("Skipping unreadable entry: {}", err),
        }
    }

    if parcels.is_empty() {
        return Err(PipelineError::NoParcels(dir.to_path_buf()));
    }

    let number = Regex::new(PARCEL_NUMBER)?;
    let mut keyed: Vec<(Option<u64>, String, PathBuf)> = parcels
        .into_iter()
        .map(|path| {
            let name = file_name(&path);
            let key = number
                .captures(&name)
                .and_then(|caps| caps.get(1))
                .and_then(|digits| digits.as_str().parse().ok());
            (key, name, path)
        })
        .collect();
    keyed.sort_by(|a, b| compare_keys(a.0, b.0).then_with(|| a.1.cmp(&b.1)));

    log::info!("Found {} parcel file(s) in {}", keyed.len(), dir.display());
    Ok(keyed.into_iter().map(|(_, _, path)| path).collect())
}

// Numbered parcels first.
fn compare_keys(a: Option<u64>, b: Option<u64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
