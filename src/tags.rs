use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::Accessor;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },
    #[error("cannot read tags from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },
}

/// Capability the rename engine needs: fetch the title tag of one file.
/// Ok(None) means the file was readable but carries no title.
pub trait TitleReader {
    fn read_title(&self, path: &Path) -> Result<Option<String>, TagError>;
}

/// Reads titles through lofty (ID3v1/v2, Vorbis comments, RIFF INFO, MP4 ilst, APE...).
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTitleReader;

impl LoftyTitleReader {
    pub fn new() -> Self {
        Self
    }
}

impl TitleReader for LoftyTitleReader {
    fn read_title(&self, path: &Path) -> Result<Option<String>, TagError> {
        let tagged_file = Probe::open(path)
            .map_err(|e| TagError::Open { path: path.to_path_buf(), source: e })?
            .read()
            .map_err(|e| TagError::Parse { path: path.to_path_buf(), source: e })?;

        // primary tag first, then any other tag type the file carries
        let title = tagged_file
            .primary_tag()
            .and_then(|t| t.title().map(|s| s.into_owned()))
            .or_else(|| {
                tagged_file
                    .tags()
                    .iter()
                    .find_map(|t| t.title().map(|s| s.into_owned()))
            });

        debug!("title for {}: {:?}", path.display(), title);
        Ok(title)
    }
}

/// In-memory reader keyed by file name, for tests and dry experiments.
/// Files not present in the map have no title.
#[derive(Debug, Default, Clone)]
pub struct StaticTitleReader {
    titles: HashMap<String, String>,
}

impl StaticTitleReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file_name: &str, title: &str) -> Self {
        self.titles.insert(file_name.to_string(), title.to_string());
        self
    }
}

impl TitleReader for StaticTitleReader {
    fn read_title(&self, path: &Path) -> Result<Option<String>, TagError> {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        Ok(self.titles.get(name).cloned())
    }
}
