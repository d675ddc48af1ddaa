use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tf_core::frame::AsciiFrame;

/// Écrit le texte de la frame tel quel (chaque ligne terminée par `\n`).
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn save_frame(frame: &AsciiFrame, path: &Path) -> Result<()> {
    std::fs::write(path, frame.as_str())
        .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    log::info!(
        "Frame {}x{} écrite dans {}",
        frame.width(),
        frame.height(),
        path.display()
    );
    Ok(())
}

/// Écrit la frame sur `out` (stdout en mode `--print`).
///
/// # Errors
/// Returns an error if the writer fails.
pub fn write_frame<W: Write>(frame: &AsciiFrame, out: &mut W) -> Result<()> {
    out.write_all(frame.as_str().as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Chemin d'instantané horodaté dans `dir` : `txtframe_<secondes>.txt`.
#[must_use]
pub fn snapshot_path(dir: &Path) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let mut path = dir.join(format!("txtframe_{secs}.txt"));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("txtframe_{secs}_{n}.txt"));
        n += 1;
    }
    path
}
