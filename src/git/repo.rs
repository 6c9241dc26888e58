use crate::error::Result;
use gix::discover;
use std::path::{Path, PathBuf};

pub struct GitRepo {
    path: PathBuf,
    git_dir: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };

        let repo = discover(&repo_path)?;
        let git_dir = repo.path().to_path_buf();
        let path = repo.workdir().map(Path::to_path_buf).unwrap_or_else(|| git_dir.clone());

        Ok(Self { path, git_dir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `.git` directory, or the repository itself when bare.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Directory name of the working tree, used as the report title.
    pub fn project_name(&self) -> String {
        let canonical = self.path.canonicalize().unwrap_or_else(|_| self.path.clone());
        canonical
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| canonical.to_string_lossy().into_owned())
    }
}
