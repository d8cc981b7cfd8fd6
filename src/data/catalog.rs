use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Rejected dataset names.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid dataset name {0:?}: must be a plain file name")]
    InvalidName(String),
}

/// List the `.json` dataset files directly inside `dir`, newest name first.
///
/// Names share the `gfs_YYYYMMDD_HH` layout, so descending name order puts
/// the latest cycle of a day ahead of the earlier ones.
pub fn list_candidates(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("listing dataset directory {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        // follows symlinks
        if !entry.path().is_file() {
            continue;
        }

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                log::warn!("Skipping non UTF-8 file name {raw:?}");
                continue;
            }
        };

        let is_json = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            names.push(name);
        }
    }

    names.sort_by(|a, b| b.cmp(a));
    log::debug!("Found {} candidate datasets in {}", names.len(), dir.display());
    Ok(names)
}

/// Resolve a dataset name to its path inside `dir`.
///
/// Only plain file names are accepted, so the result always stays inside
/// the dataset directory.
pub fn resolve(dir: &Path, name: &str) -> Result<PathBuf> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains("..");
    if !plain {
        return Err(CatalogError::InvalidName(name.to_string()).into());
    }
    Ok(dir.join(name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"[]").unwrap();
    }

    #[test]
    fn lists_only_json_files_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "gfs_20240724_00.json");
        touch(dir.path(), "gfs_20240725_00.JSON");
        touch(dir.path(), "gfs_20240723_00.json");
        touch(dir.path(), "gfs_20240723_12.json");
        touch(dir.path(), "download_log.txt");
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let names = list_candidates(dir.path()).unwrap();
        assert_eq!(
            names,
            vec![
                "gfs_20240725_00.JSON",
                "gfs_20240724_00.json",
                "gfs_20240723_12.json",
                "gfs_20240723_00.json",
            ]
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_candidates(&dir.path().join("absent")).unwrap_err();
        assert!(format!("{err:#}").contains("listing dataset directory"));
    }

    #[test]
    fn resolve_joins_plain_names() {
        let dir = Path::new("/data/json");
        assert_eq!(
            resolve(dir, "gfs_20240725_00.json").unwrap(),
            PathBuf::from("/data/json/gfs_20240725_00.json")
        );
    }

    #[test]
    fn resolve_rejects_traversal() {
        let dir = Path::new("/data/json");
        for bad in ["", "..", "../secret.json", "a/b.json", "a\\b.json", "x..json"] {
            let err = resolve(dir, bad).unwrap_err();
            assert!(
                err.downcast_ref::<CatalogError>().is_some(),
                "{bad:?} should be rejected"
            );
        }
    }
}
