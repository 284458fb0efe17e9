//! Configuration for flatstore
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

use crate::record::TableKind;

/// Main configuration for a TableStore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Backing Files
    // -------------------------------------------------------------------------
    /// users table: `id,username,location`
    pub users_path: PathBuf,

    /// posts table: `id,content,username,views`
    pub posts_path: PathBuf,

    /// engagements table: `id,postId,username,type,comment,timestamp`
    pub engagements_path: PathBuf,

    // -------------------------------------------------------------------------
    // Durability
    // -------------------------------------------------------------------------
    /// How hard each rewrite/append pushes data to stable storage
    pub sync_mode: SyncMode,
}

/// Sync strategy for rewrites and appends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// fsync the temp file before the rename and the directory after it
    /// (survives power loss)
    Fsync,

    /// Leave flushing to the OS (survives process kill, not power loss)
    Buffered,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_dir(".")
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Config with the default file names inside `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            users_path: dir.join(TableKind::Users.default_file_name()),
            posts_path: dir.join(TableKind::Posts.default_file_name()),
            engagements_path: dir.join(TableKind::Engagements.default_file_name()),
            sync_mode: SyncMode::Fsync,
        }
    }

    /// Backing file for the given table
    pub fn path_for(&self, table: TableKind) -> &Path {
        match table {
            TableKind::Users => &self.users_path,
            TableKind::Posts => &self.posts_path,
            TableKind::Engagements => &self.engagements_path,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Point all three tables at their default file names inside `dir`
    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let sync_mode = self.config.sync_mode;
        self.config = Config::from_dir(dir);
        self.config.sync_mode = sync_mode;
        self
    }

    pub fn users_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.users_path = path.into();
        self
    }

    pub fn posts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.posts_path = path.into();
        self
    }

    pub fn engagements_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.engagements_path = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.config.sync_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
