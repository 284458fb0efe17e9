//! Table Store
//!
//! The aggregate that owns the three live tables.
//!
//! ## Responsibilities
//! - Commit freshly loaded tables in one atomic swap
//! - Serialize mutations per table and persist them before they become
//!   visible in memory
//! - Answer queries over a consistent view
//!
//! ## Lock Discipline
//! ```text
//!   users ──▶ posts ──▶ engagements      (fixed acquisition order)
//!
//!   commit / rename_user      users + posts + engagements
//!   add_engagement            users + posts, then engagements
//!   update_post_views         posts
//!   get_all_user_comments     users, released, then engagements
//!   get_all_engagements_by_location
//!                             users, released, then engagements
//! ```
//! Readers and writers take the same exclusive lock. Any operation that
//! holds more than one lock acquires them in the order above, so no cycle
//! can form.

mod integrity;
mod mutation;
mod query;

use std::ops::Deref;

use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::loader::{self, LoadMode, LoadStats, LoadedTables};
use crate::record::{Engagement, Post, Table, User};

pub use integrity::IntegrityReport;

/// Three related tables over flat files, safe to share across threads
///
/// ## Concurrency Model
///
/// One `parking_lot::Mutex` per table. Mutations of the same table are
/// serialized; mutations of different tables run concurrently unless an
/// operation spans them. There is no reader/writer split.
pub struct TableStore {
    /// Paths and durability settings
    config: Config,

    users: Mutex<Table<User>>,
    posts: Mutex<Table<Post>>,
    engagements: Mutex<Table<Engagement>>,
}

/// All three tables locked in acquisition order
pub(crate) struct LockedTables<'a> {
    pub(crate) users: MutexGuard<'a, Table<User>>,
    pub(crate) posts: MutexGuard<'a, Table<Post>>,
    pub(crate) engagements: MutexGuard<'a, Table<Engagement>>,
}

impl TableStore {
    /// Create a store with empty tables. Nothing is read until a load.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            users: Mutex::new(Table::new()),
            posts: Mutex::new(Table::new()),
            engagements: Mutex::new(Table::new()),
        }
    }

    /// Create a store and run the sequential loader
    pub fn open(config: Config) -> Result<Self> {
        let store = Self::new(config);
        store.load()?;
        Ok(store)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace all tables with the content of the backing files (sequential)
    pub fn load(&self) -> Result<LoadStats> {
        self.load_with(LoadMode::Sequential)
    }

    /// Replace all tables with the content of the backing files (parallel)
    pub fn load_parallel(&self) -> Result<LoadStats> {
        self.load_with(LoadMode::Parallel)
    }

    /// Run the chosen loader and commit its result.
    ///
    /// On error the live tables are left untouched.
    pub fn load_with(&self, mode: LoadMode) -> Result<LoadStats> {
        let loaded = loader::load(&self.config, mode)?;
        Ok(self.commit(loaded, mode))
    }

    /// Swap in new tables under all three locks at once
    fn commit(&self, loaded: LoadedTables, mode: LoadMode) -> LoadStats {
        let LoadedTables {
            mut users,
            mut posts,
            mut engagements,
            stats,
        } = loaded;

        {
            let mut all = self.lock_all();
            std::mem::swap(&mut *all.users, &mut users);
            std::mem::swap(&mut *all.posts, &mut posts);
            std::mem::swap(&mut *all.engagements, &mut engagements);
        }
        // Previous tables are dropped here, outside the critical section

        tracing::info!(
            ?mode,
            users = stats.users,
            posts = stats.posts,
            engagements = stats.engagements,
            malformed = stats.malformed,
            dangling = stats.dangling,
            "committed tables"
        );
        stats
    }

    // =========================================================================
    // Read-only Accessors
    // =========================================================================

    /// Lock and borrow the users table.
    ///
    /// The lock is held until the returned guard drops; calling a store
    /// operation that needs the same table while holding it deadlocks.
    pub fn users(&self) -> TableRef<'_, User> {
        TableRef {
            guard: self.users.lock(),
        }
    }

    /// Lock and borrow the posts table (see [`TableStore::users`])
    pub fn posts(&self) -> TableRef<'_, Post> {
        TableRef {
            guard: self.posts.lock(),
        }
    }

    /// Lock and borrow the engagements table (see [`TableStore::users`])
    pub fn engagements(&self) -> TableRef<'_, Engagement> {
        TableRef {
            guard: self.engagements.lock(),
        }
    }

    /// Clone all three tables from one consistent instant
    pub fn snapshot(&self) -> Snapshot {
        let all = self.lock_all();
        Snapshot {
            users: all.users.clone(),
            posts: all.posts.clone(),
            engagements: all.engagements.clone(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Acquire every table lock, always users → posts → engagements
    pub(crate) fn lock_all(&self) -> LockedTables<'_> {
        let users = self.users.lock();
        let posts = self.posts.lock();
        let engagements = self.engagements.lock();
        LockedTables {
            users,
            posts,
            engagements,
        }
    }
}

/// Shared borrow of one live table, holding its lock
pub struct TableRef<'a, R> {
    guard: MutexGuard<'a, Table<R>>,
}

impl<R> Deref for TableRef<'_, R> {
    type Target = Table<R>;

    fn deref(&self) -> &Table<R> {
        &self.guard
    }
}

/// Owned copy of all three tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub users: Table<User>,
    pub posts: Table<Post>,
    pub engagements: Table<Engagement>,
}
