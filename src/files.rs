use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

use log::{error, info, warn};
use tokio::fs;

use crate::backend::FindError;

pub struct FileAreas {
    uploads: PathBuf,
    results: PathBuf,
}

impl FileAreas {
    pub fn new(root: &Path) -> Self {
        Self {
            uploads: root.join("uploads"),
            results: root.join("results"),
        }
    }

    /// Creates both directories if needed. Safe to call repeatedly.
    pub async fn init(&self) -> io::Result<()> {
        for dir in [&self.uploads, &self.results] {
            fs::create_dir_all(dir).await.map_err(|e| {
                error!("couldn't create {dir:?}: {e}");
                e
            })?;

            if !fs::metadata(dir).await?.is_dir() {
                error!("{dir:?} exists but isn't a directory");
                return Err(ErrorKind::AlreadyExists.into());
            }
        }

        info!("uploads in {:?}, results in {:?}", self.uploads, self.results);
        Ok(())
    }

    pub fn uploads(&self) -> &Path {
        &self.uploads
    }

    /// Writes `data` under the last component of `filename`, replacing any
    /// earlier upload of the same name.
    pub async fn save_upload(&self, filename: &str, data: &[u8]) -> io::Result<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "no file name"))?;
        let path = self.uploads().join(name);

        fs::write(&path, data).await?;
        info!("saved upload {path:?}, {} bytes", data.len());

        Ok(path)
    }

    pub async fn list_results(&self) -> io::Result<Vec<String>> {
        let mut names = vec![];
        let mut dir = fs::read_dir(&self.results).await?;

        while let Some(ent) = dir.next_entry().await? {
            if !ent.file_type().await?.is_file() {
                continue;
            }

            match ent.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!("skipping non utf-8 result {name:?}"),
            }
        }

        Ok(names)
    }

    pub fn result_path(&self, name: &str) -> Result<PathBuf, FindError> {
        let mut components = Path::new(name).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) && !name.contains(['/', '\\']);

        plain
            .then(|| self.results.join(name))
            .ok_or(FindError::NotFound)
    }

    pub async fn read_result(&self, name: &str) -> io::Result<Vec<u8>> {
        let path = self
            .result_path(name)
            .map_err(|_| io::Error::from(ErrorKind::NotFound))?;

        if !fs::metadata(&path).await?.is_file() {
            return Err(ErrorKind::NotFound.into());
        }

        fs::read(&path).await
    }
}
