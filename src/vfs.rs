//! Host filesystem-layer interface
//!
//! This crate does not own the inode cache, the dentry tree or the open-file
//! table; those live in the surrounding kernel. This module defines the
//! narrow interface the mount path consumes from that substrate.

use std::os::unix::io::RawFd;
use std::sync::Arc;

use crate::connection::Connection;
use crate::inode::{FileAttr, Inode};

/// A resolved open file handle.
///
/// Holding a `Handle` keeps the underlying open file alive; dropping it
/// releases the reference again. Only handles open on the connection device
/// carry a [`Connection`] as their private state; resolving any other
/// descriptor yields a handle that fails the device check.
#[derive(Debug)]
pub struct Handle {
    connection: Option<Arc<Connection>>,
}

impl Handle {
    /// A handle open on the connection device, sharing its connection.
    pub fn connection_device(connection: Arc<Connection>) -> Handle {
        Handle { connection: Some(connection) }
    }

    /// A handle open on some unrelated file.
    pub fn other() -> Handle {
        Handle { connection: None }
    }

    /// The connection carried by a connection-device handle. `None` for
    /// handles open on anything else.
    pub fn connection(&self) -> Option<&Arc<Connection>> {
        self.connection.as_ref()
    }
}

/// Interface to the surrounding kernel filesystem layer.
pub trait Vfs {
    /// Whatever the dentry layer uses to represent the root entry of a
    /// mounted filesystem.
    type RootEntry;

    /// Resolve an open file descriptor to its handle. Returns `None` if the
    /// descriptor does not name an open file.
    fn resolve_fd(&self, fd: RawFd) -> Option<Handle>;

    /// Get or create the in-memory inode `ino` from an attribute snapshot.
    /// Returns `None` if the cache cannot allocate it.
    fn iget(&self, ino: u64, generation: u64, attr: &FileAttr) -> Option<Arc<Inode>>;

    /// Allocate the root directory entry for a freshly mounted filesystem.
    /// Returns `None` if the dentry layer cannot allocate it.
    fn alloc_root_entry(&self, root: &Arc<Inode>) -> Option<Self::RootEntry>;
}
