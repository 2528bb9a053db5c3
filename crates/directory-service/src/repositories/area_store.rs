//! Filesystem-backed area store.
//!
//! Names passed to the store must already have passed
//! [`common::naming::is_name_safe`]; the store joins them onto its root
//! without further checks.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tokio::fs;
use tracing::instrument;

/// Permission bits for newly created area directories.
#[cfg(unix)]
const AREA_DIR_MODE: u32 = 0o750;

/// Storage operations needed by the area and user directory services.
#[async_trait]
pub trait AreaStore: Send + Sync {
    /// Create the directory backing `area`. Succeeds if it already exists.
    async fn create_area_dir(&self, area: &str) -> io::Result<()>;

    /// Whether a directory exists for `area`.
    async fn area_exists(&self, area: &str) -> io::Result<bool>;

    /// Member names of `area`.
    ///
    /// Returns an `io::ErrorKind::NotFound` error if the area does not exist.
    async fn list_members(&self, area: &str) -> io::Result<Vec<String>>;

    /// Create an empty member record for `user` in `area`.
    ///
    /// Returns an `io::ErrorKind::AlreadyExists` error if the record exists.
    async fn create_member(&self, area: &str, user: &str) -> io::Result<()>;
}

/// [`AreaStore`] over `tokio::fs`, rooted at a storage directory.
#[derive(Debug, Clone)]
pub struct FsAreaStore {
    root: PathBuf,
}

impl FsAreaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn area_path(&self, area: &str) -> PathBuf {
        self.root.join(area)
    }
}

#[async_trait]
impl AreaStore for FsAreaStore {
    #[instrument(skip_all, name = "directory.store.create_area_dir", fields(area = %area))]
    async fn create_area_dir(&self, area: &str) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(AREA_DIR_MODE);
        builder.create(self.area_path(area)).await
    }

    async fn area_exists(&self, area: &str) -> io::Result<bool> {
        match fs::metadata(self.area_path(area)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all, name = "directory.store.list_members", fields(area = %area))]
    async fn list_members(&self, area: &str) -> io::Result<Vec<String>> {
        let mut entries = fs::read_dir(self.area_path(area)).await?;
        let mut members = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            // Non-UTF-8 names cannot have been written by this service
            if let Ok(name) = entry.file_name().into_string() {
                members.push(name);
            }
        }

        Ok(members)
    }

    #[instrument(skip_all, name = "directory.store.create_member", fields(area = %area))]
    async fn create_member(&self, area: &str, user: &str) -> io::Result<()> {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.area_path(area).join(user))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod mock {
    //! In-memory store that records every call, for asserting that
    //! rejected requests never reach storage.

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAreaStore {
        areas: Mutex<HashMap<String, Vec<String>>>,
        pub calls: AtomicUsize,
        pub fail_with: Mutex<Option<io::ErrorKind>>,
        /// Number of upcoming `create_member` calls that report a collision.
        pub collisions: AtomicUsize,
    }

    impl MockAreaStore {
        pub fn with_area(area: &str, members: &[&str]) -> Self {
            let store = Self::default();
            store.areas.lock().unwrap().insert(
                area.to_string(),
                members.iter().map(|m| (*m).to_string()).collect(),
            );
            store
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn members(&self, area: &str) -> Vec<String> {
            self.areas
                .lock()
                .unwrap()
                .get(area)
                .cloned()
                .unwrap_or_default()
        }

        fn enter(&self) -> io::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match *self.fail_with.lock().unwrap() {
                Some(kind) => Err(io::Error::from(kind)),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl AreaStore for MockAreaStore {
        async fn create_area_dir(&self, area: &str) -> io::Result<()> {
            self.enter()?;
            self.areas
                .lock()
                .unwrap()
                .entry(area.to_string())
                .or_default();
            Ok(())
        }

        async fn area_exists(&self, area: &str) -> io::Result<bool> {
            self.enter()?;
            Ok(self.areas.lock().unwrap().contains_key(area))
        }

        async fn list_members(&self, area: &str) -> io::Result<Vec<String>> {
            self.enter()?;
            self.areas
                .lock()
                .unwrap()
                .get(area)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        async fn create_member(&self, area: &str, user: &str) -> io::Result<()> {
            self.enter()?;
            if self
                .collisions
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(io::Error::from(io::ErrorKind::AlreadyExists));
            }
            let mut areas = self.areas.lock().unwrap();
            let members = areas
                .get_mut(area)
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
            members.push(user.to_string());
            Ok(())
        }
    }
}
