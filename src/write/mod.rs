// src/write/mod.rs

pub mod columnar;
pub mod delimited;
pub mod summary;

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub use columnar::write_dataset_parquet;
pub use delimited::{write_dataset_csv, write_records_csv};
pub use summary::{write_manifest_csv, write_summary_json};

fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "artifact".into());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write `path` by filling a temporary sibling and renaming it over the
/// destination, so readers only ever see a complete file.
pub(crate) fn replace_file<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }
    let tmp_path = tmp_path_for(path);
    let file =
        File::create(&tmp_path).with_context(|| format!("creating {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);
    if let Err(e) = fill(&mut writer).and_then(|_| writer.flush().map_err(Into::into)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    drop(writer);
    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn replaces_existing_file_and_leaves_no_tmp() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("out.csv");
        replace_file(&path, |w| Ok(w.write_all(b"first\nsecond\n")?))?;
        replace_file(&path, |w| Ok(w.write_all(b"third\n")?))?;
        assert_eq!(fs::read_to_string(&path)?, "third\n");
        assert!(!tmp_path_for(&path).exists());
        Ok(())
    }

    #[test]
    fn failed_fill_keeps_previous_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        fs::write(&path, "keep\n")?;
        let res = replace_file(&path, |_| anyhow::bail!("boom"));
        assert!(res.is_err());
        assert_eq!(fs::read_to_string(&path)?, "keep\n");
        assert!(!tmp_path_for(&path).exists());
        Ok(())
    }
}
