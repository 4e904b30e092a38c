//! Persisting captured artifacts to disk.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::Result;

/// Timestamp layout embedded in artifact file names.
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Screenshot,
    Pdf,
}

impl ArtifactKind {
    fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "screenshot",
            ArtifactKind::Pdf => "page",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "jpg",
            ArtifactKind::Pdf => "pdf",
        }
    }

    /// `screenshot_20240102030405.jpg`, `page_20240102030405.pdf`
    pub fn file_name(self, at: &DateTime<Local>) -> String {
        format!(
            "{}_{}.{}",
            self.prefix(),
            at.format(ARTIFACT_TIMESTAMP_FORMAT),
            self.extension()
        )
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Screenshot => f.write_str("Screenshot"),
            ArtifactKind::Pdf => f.write_str("PDF"),
        }
    }
}

/// Writes artifacts into one output directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<PathBuf> {
        self.write_at(kind, bytes, &Local::now())
    }

    pub fn write_at(&self, kind: ArtifactKind, bytes: &[u8], at: &DateTime<Local>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(kind.file_name(at));
        std::fs::write(&path, bytes)?;
        info!(kind = %kind, path = %path.display(), size = bytes.len(), "Artifact saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn file_names_embed_second_resolution_timestamp() {
        let at = fixed_time();
        assert_eq!(
            ArtifactKind::Screenshot.file_name(&at),
            "screenshot_20240102030405.jpg"
        );
        assert_eq!(ArtifactKind::Pdf.file_name(&at), "page_20240102030405.pdf");
    }

    #[test]
    fn creates_missing_output_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(tmp.path().join("nested").join("out"));

        let path = writer
            .write_at(ArtifactKind::Pdf, b"%PDF-1.7", &fixed_time())
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        assert!(path.starts_with(writer.dir()));
    }

    #[test]
    fn write_fails_when_directory_is_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let writer = ArtifactWriter::new(file.path());

        let err = writer.write(ArtifactKind::Screenshot, b"x").unwrap_err();

        assert!(matches!(err, crate::ToolboxError::Io(_)));
    }
}
