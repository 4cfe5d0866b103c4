//! FUSE kernel interface
//!
//! Types and definitions shared between the kernel side (this crate) and the
//! filesystem daemon. The protocol is versioned; a daemon handle may only be
//! mounted by a caller that was built against the same version, which is
//! checked before anything else during the mount handshake.

#![allow(non_camel_case_types, missing_docs, dead_code)]

pub const FUSE_KERNEL_VERSION: u32 = 7;

/// Inode number of the root of a mounted filesystem
pub const FUSE_ROOT_ID: u64 = 1;

/// Magic recorded on every mounted instance
pub const FUSE_SUPER_MAGIC: u32 = 0x6573_5546;

/// Block size reported for mounted instances
pub const FUSE_BLOCK_SIZE: u32 = 1024;
pub const FUSE_BLOCK_SIZE_BITS: u32 = 10;

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct fuse_in_header {
    pub len: u32,
    pub opcode: u32,
    /// Reply correlation id, assigned by the transport layer when the
    /// message is queued. Zero for messages that expect no reply.
    pub unique: u64,
    pub nodeid: u64,
    pub uid: u32,
    pub gid: u32,
    pub pid: u32,
    pub padding: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct fuse_forget_in {
    pub generation: u64,
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum fuse_opcode {
    FUSE_LOOKUP = 1,
    FUSE_FORGET = 2,                                    // no reply
    FUSE_GETATTR = 3,
    FUSE_SETATTR = 4,
    FUSE_READLINK = 5,
    FUSE_SYMLINK = 6,
    FUSE_MKNOD = 8,
    FUSE_MKDIR = 9,
    FUSE_UNLINK = 10,
    FUSE_RMDIR = 11,
    FUSE_RENAME = 12,
    FUSE_LINK = 13,
    FUSE_OPEN = 14,
    FUSE_READ = 15,
    FUSE_WRITE = 16,
}

impl fuse_opcode {
    pub fn from_u32(n: u32) -> Option<fuse_opcode> {
        match n {
            1 => Some(fuse_opcode::FUSE_LOOKUP),
            2 => Some(fuse_opcode::FUSE_FORGET),
            3 => Some(fuse_opcode::FUSE_GETATTR),
            4 => Some(fuse_opcode::FUSE_SETATTR),
            5 => Some(fuse_opcode::FUSE_READLINK),
            6 => Some(fuse_opcode::FUSE_SYMLINK),
            8 => Some(fuse_opcode::FUSE_MKNOD),
            9 => Some(fuse_opcode::FUSE_MKDIR),
            10 => Some(fuse_opcode::FUSE_UNLINK),
            11 => Some(fuse_opcode::FUSE_RMDIR),
            12 => Some(fuse_opcode::FUSE_RENAME),
            13 => Some(fuse_opcode::FUSE_LINK),
            14 => Some(fuse_opcode::FUSE_OPEN),
            15 => Some(fuse_opcode::FUSE_READ),
            16 => Some(fuse_opcode::FUSE_WRITE),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn opcode_roundtrip() {
        assert_eq!(fuse_opcode::from_u32(2), Some(fuse_opcode::FUSE_FORGET));
        assert_eq!(fuse_opcode::FUSE_FORGET as u32, 2);
    }

    #[test]
    fn opcode_unknown() {
        assert_eq!(fuse_opcode::from_u32(7), None);
        assert_eq!(fuse_opcode::from_u32(9999), None);
    }
}
