//! In-memory inode objects
//!
//! An inode is a cached filesystem object. Inodes are created by the
//! external inode cache on first reference from an attribute snapshot and
//! destroyed by it when their reference count drops to zero; right before
//! the memory is released, the cache hands the inode to
//! [`MountInstance::forget`](crate::MountInstance::forget) so the daemon
//! hears about the eviction.

/// File attributes.
///
/// The metadata snapshot an inode is created from. Opaque to the mount and
/// connection machinery except for the mode bits of the root inode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FileAttr {
    /// File mode (permission and type bits).
    pub mode: u32,
    /// Number of hard links.
    pub nlink: u32,
    /// User id of the file owner.
    pub uid: u32,
    /// Group id of the file owner.
    pub gid: u32,
    /// Rdev.
    pub rdev: u32,
    /// Size in bytes.
    pub size: u64,
    /// Size in blocks.
    pub blocks: u64,
    /// Time of last access.
    pub atime: u64,
    /// Time of last modification.
    pub mtime: u64,
    /// Time of last change.
    pub ctime: u64,
}

/// A cached filesystem object.
#[derive(Clone, Debug)]
pub struct Inode {
    ino: u64,
    generation: u64,
    attr: FileAttr,
}

impl Inode {
    /// Create an inode from an attribute snapshot.
    pub fn new(ino: u64, generation: u64, attr: FileAttr) -> Inode {
        Inode { ino, generation, attr }
    }

    /// Inode number, stable and unique within a mount.
    pub fn ino(&self) -> u64 {
        self.ino
    }

    /// Generation stamp distinguishing reuses of the same inode number over
    /// time.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The attribute snapshot this inode was created from.
    pub fn attr(&self) -> &FileAttr {
        &self.attr
    }
}
