//! Mounting and unmounting
//!
//! A mount begins by validating the caller-supplied mount data, resolving
//! the daemon handle it names and binding that handle's connection to a new
//! mount instance. While mounted, the instance forwards inode evictions to
//! the daemon as forget notifications. Dropping the instance unbinds the
//! connection and releases the mount's share of it.

use libc::{c_int, EBADF, EBUSY, EINVAL, ENOMEM, EPROTO};
use log::{debug, error, info};
use std::fmt;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::argument::ArgumentIterator;
use crate::connection::Connection;
use crate::inode::{FileAttr, Inode};
use crate::kernel::{FUSE_BLOCK_SIZE, FUSE_KERNEL_VERSION, FUSE_ROOT_ID, FUSE_SUPER_MAGIC};
use crate::message::Message;
use crate::vfs::Vfs;

/// Mount input record, as serialized by the calling layer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MountData {
    /// Protocol version the caller was built against. Must match
    /// [`FUSE_KERNEL_VERSION`](crate::kernel::FUSE_KERNEL_VERSION).
    pub version: u32,
    /// Descriptor of the already-open daemon handle to mount on.
    pub fd: RawFd,
    /// Permission and type bits for the root inode.
    pub root_mode: u32,
}

impl MountData {
    /// Parse a mount data record from raw bytes. Returns `None` if the
    /// buffer is too short to hold one.
    pub fn from_bytes(data: &[u8]) -> Option<MountData> {
        ArgumentIterator::new(data).fetch()
    }
}

/// Identity of a mount instance.
///
/// Recorded on a [`Connection`] while the instance is bound to it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MountId(u64);

impl MountId {
    pub(crate) fn next() -> MountId {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        MountId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Error type returned when mounting fails.
///
/// All failures are synchronous and abort the mount with every partially
/// acquired resource released again; none are retried internally.
#[derive(Debug, Eq, PartialEq)]
pub enum MountError {
    /// No or malformed mount data was supplied.
    InvalidMountData,
    /// The caller was built against a different protocol version.
    VersionMismatch {
        /// Version found in the mount data.
        found: u32,
        /// Version this crate implements.
        expected: u32,
    },
    /// The descriptor does not name an open connection-device handle.
    BadHandle(RawFd),
    /// The connection is already bound to another mount.
    ConnectionBusy,
    /// The inode cache could not allocate the root inode.
    RootAllocationFailed,
    /// The dentry layer could not allocate the root entry.
    RootEntryAllocationFailed,
}

impl MountError {
    /// The errno equivalent reported to the host mount table.
    pub fn errno(&self) -> c_int {
        match *self {
            MountError::InvalidMountData => EINVAL,
            MountError::VersionMismatch { .. } => EPROTO,
            MountError::BadHandle(_) => EBADF,
            MountError::ConnectionBusy => EBUSY,
            MountError::RootAllocationFailed => ENOMEM,
            MountError::RootEntryAllocationFailed => ENOMEM,
        }
    }
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MountError::InvalidMountData => write!(f, "Bad mount data"),
            MountError::VersionMismatch { found, expected } => {
                write!(f, "Bad version: {} (expected {})", found, expected)
            }
            MountError::BadHandle(fd) => write!(f, "Bad file: {}", fd),
            MountError::ConnectionBusy => write!(f, "Connection already mounted"),
            MountError::RootAllocationFailed => write!(f, "Failed to get root inode"),
            MountError::RootEntryAllocationFailed => write!(f, "Failed to allocate root entry"),
        }
    }
}

impl std::error::Error for MountError {}

/// A mounted filesystem instance.
///
/// Created by [`mount`], destroyed by dropping. The instance co-owns its
/// connection with the daemon handle's holder; dropping the instance unbinds
/// the connection and gives up the mount's share, after which the instance
/// side never touches the connection again.
#[derive(Debug)]
pub struct MountInstance<R> {
    id: MountId,
    connection: Arc<Connection>,
    root: Arc<Inode>,
    root_entry: R,
    block_size: u32,
    magic: u32,
}

impl<R> MountInstance<R> {
    /// Identity of this instance.
    pub fn id(&self) -> MountId {
        self.id
    }

    /// The connection this instance is mounted on.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// The root inode.
    pub fn root(&self) -> &Arc<Inode> {
        &self.root
    }

    /// The root directory entry, as allocated by the dentry layer.
    pub fn root_entry(&self) -> &R {
        &self.root_entry
    }

    /// Block size reported for this instance.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Filesystem magic of this instance.
    pub fn magic(&self) -> u32 {
        self.magic
    }

    /// Notify the daemon that the inode cache is dropping `inode`.
    ///
    /// Invoked by the cache once per inode, right before the inode's memory
    /// is released. Best-effort: the message expects no reply, and a failure
    /// to queue it only delays cleanup on the daemon side, so it is not
    /// surfaced; reclamation proceeds regardless.
    pub fn forget(&self, inode: &Inode) {
        debug!("FORGET ino {:#018x}, generation {}", inode.ino(), inode.generation());
        let msg = Message::forget(inode.ino(), inode.generation());
        if let Err(err) = self.connection.send(&msg) {
            debug!("Dropped forget for ino {:#018x} ({})", inode.ino(), err);
        }
    }
}

impl<R> Drop for MountInstance<R> {
    /// Dropping a `MountInstance` unbinds the connection and releases the
    /// mount's share of it. The connection itself goes away once the handle
    /// side has closed as well.
    fn drop(&mut self) {
        info!("Unmounting mount {:?}", self.id);
        self.connection.unbind();
    }
}

/// Unbinds the connection again if a later mount step fails.
struct BindGuard<'a> {
    connection: &'a Connection,
    armed: bool,
}

impl<'a> BindGuard<'a> {
    fn new(connection: &'a Connection) -> BindGuard<'a> {
        BindGuard { connection, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<'a> Drop for BindGuard<'a> {
    fn drop(&mut self) {
        if self.armed {
            self.connection.unbind();
        }
    }
}

/// Mount a filesystem instance on an already-open daemon handle.
///
/// Validates `data`, resolves the handle it names, binds the handle's
/// connection to a fresh instance and constructs the root inode and root
/// entry. On failure, every step taken so far is undone before returning;
/// an aborted mount leaves no observable state behind.
pub fn mount<V: Vfs>(
    vfs: &V,
    data: Option<&MountData>,
) -> Result<MountInstance<V::RootEntry>, MountError> {
    let data = match data {
        Some(data) => data,
        None => {
            error!("Bad mount data");
            return Err(MountError::InvalidMountData);
        }
    };
    if data.version != FUSE_KERNEL_VERSION {
        error!("Bad version: {}", data.version);
        return Err(MountError::VersionMismatch {
            found: data.version,
            expected: FUSE_KERNEL_VERSION,
        });
    }

    // Resolve the descriptor and take the connection out of its private
    // state. The handle reference is released right after; the connection's
    // lifetime is independent of the handle staying resolved.
    let connection = {
        let handle = vfs.resolve_fd(data.fd).ok_or_else(|| {
            error!("Bad file: {}", data.fd);
            MountError::BadHandle(data.fd)
        })?;
        match handle.connection() {
            Some(connection) => connection.clone(),
            None => {
                error!("Bad file: {}", data.fd);
                return Err(MountError::BadHandle(data.fd));
            }
        }
    };

    let attr = FileAttr { mode: data.root_mode, ..FileAttr::default() };
    let root = vfs.iget(FUSE_ROOT_ID, 0, &attr).ok_or_else(|| {
        error!("Failed to get root inode");
        MountError::RootAllocationFailed
    })?;

    let id = MountId::next();
    if connection.bind(id).is_err() {
        error!("Connection already mounted");
        return Err(MountError::ConnectionBusy);
    }

    // From here on the binding must be undone if anything else fails.
    let guard = BindGuard::new(&connection);
    let root_entry = match vfs.alloc_root_entry(&root) {
        Some(root_entry) => root_entry,
        None => {
            error!("Failed to allocate root entry");
            return Err(MountError::RootEntryAllocationFailed);
        }
    };
    guard.disarm();

    info!("Mounting daemon fd {} (root mode {:#o})", data.fd, data.root_mode);
    Ok(MountInstance {
        id,
        connection,
        root,
        root_entry,
        block_size: FUSE_BLOCK_SIZE,
        magic: FUSE_SUPER_MAGIC,
    })
}
