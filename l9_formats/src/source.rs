//! File access used by the prober and the picture archive.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use walkdir::WalkDir;

/// Game data files, looked up by case-insensitive name.
pub trait DataSource {
    fn exists(&self, name: &str) -> bool;

    fn read(&self, name: &str) -> Result<Vec<u8>>;

    fn size(&self, name: &str) -> Result<u64> {
        Ok(self.read(name)?.len() as u64)
    }

    /// Read at most `len` leading bytes.
    fn read_prefix(&self, name: &str, len: usize) -> Result<Vec<u8>> {
        let mut bytes = self.read(name)?;
        bytes.truncate(len);
        Ok(bytes)
    }
}

/// Files directly inside a game directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    files: BTreeMap<String, PathBuf>,
}

impl DirSource {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut files = BTreeMap::new();
        for entry in WalkDir::new(&root).min_depth(1).max_depth(1) {
            let entry = entry.with_context(|| format!("scanning {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                files.insert(name.to_ascii_lowercase(), entry.into_path());
            }
        }
        Ok(Self { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    fn path(&self, name: &str) -> Result<&PathBuf> {
        self.files
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| anyhow!("{name} not found in {}", self.root.display()))
    }
}

impl DataSource for DirSource {
    fn exists(&self, name: &str) -> bool {
        self.files.contains_key(&name.to_ascii_lowercase())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path(name)?;
        fs::read(path).with_context(|| format!("reading {}", path.display()))
    }

    fn size(&self, name: &str) -> Result<u64> {
        let path = self.path(name)?;
        let metadata =
            fs::metadata(path).with_context(|| format!("inspecting {}", path.display()))?;
        Ok(metadata.len())
    }
}

/// In-memory file set, handy for tests and for data pulled from other containers.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, data: impl Into<Vec<u8>>) {
        self.files
            .insert(name.as_ref().to_ascii_lowercase(), data.into());
    }

    pub fn with_file(mut self, name: impl AsRef<str>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }
}

impl DataSource for MemorySource {
    fn exists(&self, name: &str) -> bool {
        self.files.contains_key(&name.to_ascii_lowercase())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| anyhow!("{name} not found"))
    }

    fn size(&self, name: &str) -> Result<u64> {
        self.files
            .get(&name.to_ascii_lowercase())
            .map(|data| data.len() as u64)
            .ok_or_else(|| anyhow!("{name} not found"))
    }
}

impl<S: DataSource + ?Sized> DataSource for &S {
    fn exists(&self, name: &str) -> bool {
        (**self).exists(name)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        (**self).read(name)
    }

    fn size(&self, name: &str) -> Result<u64> {
        (**self).size(name)
    }

    fn read_prefix(&self, name: &str, len: usize) -> Result<Vec<u8>> {
        (**self).read_prefix(name, len)
    }
}
