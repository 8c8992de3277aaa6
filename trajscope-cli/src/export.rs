use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use trajscope_core::SessionReport;

use crate::reports::{generate_csv_report, generate_json_report};

pub const CSV_EXPORT_FILE: &str = "outcomes.csv";
pub const JSON_EXPORT_FILE: &str = "outcomes.json";

/// Refuse to reuse an existing export directory unless `force` is set.
pub fn ensure_output_dir_available(dir: &Path, force: bool) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        bail!("output path {} exists and is not a directory", dir.display());
    }
    if dir.exists() && !force {
        bail!(
            "output directory {} already exists; pass --force to overwrite",
            dir.display()
        );
    }
    Ok(())
}

/// Write the outcome tables into `dir`, returning the files written.
pub fn write_exports(dir: &Path, reports: &[SessionReport]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let csv_path = dir.join(CSV_EXPORT_FILE);
    write_with(&csv_path, |out| generate_csv_report(out, reports))?;

    let json_path = dir.join(JSON_EXPORT_FILE);
    write_with(&json_path, |out| generate_json_report(out, reports))?;

    Ok(vec![csv_path, json_path])
}

fn write_with(path: &Path, render: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    render(&mut writer).with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}
