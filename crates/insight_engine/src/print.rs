use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use insight_logging::insight_info;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct PrintSettings {
    pub output_dir: PathBuf,
    /// Open the written document in the system viewer, which shows the print dialog.
    pub open_viewer: bool,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./print"),
            open_viewer: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("print directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("could not open viewer: {0}")]
    Viewer(String),
}

/// Ensure the print directory exists; create it if missing.
pub fn ensure_print_dir(dir: &Path) -> Result<(), PrintError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PrintError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PrintError::OutputDir("path is not a directory".into()));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| PrintError::OutputDir(e.to_string()))
}

/// Writes print documents into a separate file so the live view is never touched.
#[derive(Debug, Clone)]
pub struct PrintWriter {
    settings: PrintSettings,
}

impl PrintWriter {
    pub fn new(settings: PrintSettings) -> Self {
        Self { settings }
    }

    /// Atomically writes `document` to `{output_dir}/{file_name}` through a
    /// temp file, replacing any earlier document of the same name.
    pub fn write(&self, file_name: &str, document: &str) -> Result<PathBuf, PrintError> {
        let dir = &self.settings.output_dir;
        ensure_print_dir(dir)?;

        let target = dir.join(file_name);
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(document.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PrintError::Io(e.error))?;
        Ok(target)
    }

    /// Writes the document and, if configured, opens it for printing.
    pub fn print(&self, file_name: &str, document: &str) -> Result<PathBuf, PrintError> {
        let path = self.write(file_name, document)?;
        insight_info!("print document written to {:?}", path);
        if self.settings.open_viewer {
            open::that(&path).map_err(|e| PrintError::Viewer(e.to_string()))?;
        }
        Ok(path)
    }
}
