use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use ahash::AHashMap;

/// Opens named files relative to a search root.
pub trait VFileResolver {
    fn open(&self, path: &str) -> io::Result<Vec<u8>>;

    fn exists(&self, path: &str) -> bool;
}

/// Source paths are case insensitive and may use either separator.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}

#[derive(Default, Clone)]
pub struct VFile {
    pub data: Vec<u8>,
}

/// In-memory files, keyed by normalized path.
#[derive(Default, Clone)]
pub struct VFileSystem {
    pub files: Arc<AHashMap<String, VFile>>,
}

impl VFileSystem {
    pub fn new<P: AsRef<str>>(files: impl IntoIterator<Item = (P, Vec<u8>)>) -> Self {
        let files = files
            .into_iter()
            .map(|(path, data)| (normalize(path.as_ref()), VFile { data }))
            .collect();
        Self {
            files: Arc::new(files),
        }
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        match self.files.get(&normalize(path)) {
            Some(file) => Some(&file.data[..]),
            None => {
                log::error!("{:?} file not found", path);
                None
            }
        }
    }
}

impl VFileResolver for VFileSystem {
    fn open(&self, path: &str) -> io::Result<Vec<u8>> {
        self.get(path).map(<[u8]>::to_vec).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{path} not in file system"))
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }
}

/// Files under a directory on disk.
#[derive(Clone, Debug)]
pub struct VDirectory {
    root: PathBuf,
}

impl VDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.replace('\\', "/"))
    }
}

impl VFileResolver for VDirectory {
    fn open(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }
}
