//! Reading the batch-parameter file and grouping its lines per compute node.
use crate::error::{Error, Result};
use crate::settings::Settings;
use log::warn;
use std::{fs, path::Path};

/// The job lines of a batch file, after trailing blank lines and ignorable
/// lines have been removed. Order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFile {
    pub lines: Vec<String>,
}

/// Number of scripts needed for `lines` jobs at `per_node` jobs each.
pub fn node_count(lines: usize, per_node: usize) -> usize {
    lines.div_ceil(per_node.max(1))
}

impl BatchFile {
    pub fn read(path: &Path, settings: &Settings) -> Result<BatchFile> {
        let bytes = fs::read(path)
            .map_err(|e| Error::io(format!("could not read batch file {:?}", path), e))?;
        let text = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            Error::Validation(format!(
                "batch file {:?} is not valid UTF-8 (line {})",
                path, line
            ))
        })?;
        let batch = BatchFile::from_text(&text, settings.batch_file_ignore_prefix.as_deref());
        if batch.is_empty() {
            warn!("batch file {:?} contains no jobs", path);
        }
        Ok(batch)
    }

    pub fn from_text(text: &str, ignore_prefix: Option<&str>) -> BatchFile {
        let mut lines: Vec<String> = text.lines().map(str::to_owned).collect();
        while lines.last().map_or(false, |l| l.is_empty()) {
            lines.pop();
        }
        if let Some(prefix) = ignore_prefix {
            lines.retain(|l| !l.trim().starts_with(prefix));
        }
        BatchFile { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Node-ordered groups of at most `per_node` consecutive lines.
    pub fn partition(&self, per_node: usize) -> impl Iterator<Item = (usize, &[String])> {
        self.lines.chunks(per_node.max(1)).enumerate()
    }
}
