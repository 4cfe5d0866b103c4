//! Outgoing daemon messages
//!
//! A message describes a single request for the filesystem daemon: a fixed
//! header naming the operation and target inode, followed by an
//! opcode-specific argument payload. Messages are constructed and handed
//! straight to the transport layer, which queues them for the daemon and
//! correlates replies for the opcodes that expect one.

use std::io;
use std::mem;
use std::slice;

use crate::kernel::{fuse_forget_in, fuse_in_header, fuse_opcode};

/// View an arbitrary `#[repr(C)]` value as its raw bytes (useful for wire
/// header and argument types)
fn as_bytes<T>(data: &T) -> &[u8] {
    let len = mem::size_of::<T>();
    let p = data as *const T as *const u8;
    unsafe { slice::from_raw_parts(p, len) }
}

/// A single request for the filesystem daemon.
#[derive(Clone, Debug)]
pub struct Message {
    header: fuse_in_header,
    arg: Vec<u8>,
}

impl Message {
    /// Create a new message for the given operation, directed at the inode
    /// `nodeid`, carrying the given argument. The header's `unique` field is
    /// left zero; opcodes that expect a reply get it assigned by the
    /// transport layer when the message is queued.
    pub fn new<A: Copy>(opcode: fuse_opcode, nodeid: u64, arg: &A) -> Message {
        let arg = as_bytes(arg).to_vec();
        let header = fuse_in_header {
            len: (mem::size_of::<fuse_in_header>() + arg.len()) as u32,
            opcode: opcode as u32,
            unique: 0,
            nodeid,
            uid: 0,
            gid: 0,
            pid: 0,
            padding: 0,
        };
        Message { header, arg }
    }

    /// Build the one-way notification telling the daemon that the kernel
    /// side dropped the cached inode `nodeid`. Carries the inode's
    /// generation stamp so the daemon can recognize notifications that refer
    /// to an earlier use of a since-reused inode number.
    pub fn forget(nodeid: u64, generation: u64) -> Message {
        Message::new(fuse_opcode::FUSE_FORGET, nodeid, &fuse_forget_in { generation })
    }

    /// The message header.
    pub fn header(&self) -> &fuse_in_header {
        &self.header
    }

    /// Operation tag of this message.
    pub fn opcode(&self) -> u32 {
        self.header.opcode
    }

    /// Inode this message is directed at.
    pub fn nodeid(&self) -> u64 {
        self.header.nodeid
    }

    /// The opcode-specific argument payload.
    pub fn arg(&self) -> &[u8] {
        &self.arg
    }

    /// Serialize to wire bytes: the header followed by the argument payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.header.len as usize);
        buf.extend_from_slice(as_bytes(&self.header));
        buf.extend_from_slice(&self.arg);
        buf
    }
}

/// Transport seam to the filesystem daemon.
///
/// Implemented by the layer that owns the request queue the daemon reads
/// from. This crate only ever queues; replies, where an opcode expects one,
/// are the transport layer's business.
pub trait Transport: Send + Sync {
    /// Queue a message for delivery to the daemon without waiting for
    /// anything. The daemon may be gone already; the caller decides whether
    /// a failure to queue matters.
    fn send(&self, msg: &Message) -> io::Result<()>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[cfg(target_endian = "little")]
    fn forget_bytes() {
        let msg = Message::forget(0xaabb, 0x1122_3344);
        let expected = vec![
            0x30, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, // len 48, opcode FORGET
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // unique 0
            0xbb, 0xaa, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // nodeid
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // uid, gid
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // pid, padding
            0x44, 0x33, 0x22, 0x11, 0x00, 0x00, 0x00, 0x00, // generation
        ];
        assert_eq!(msg.to_bytes(), expected);
    }

    #[test]
    fn forget_expects_no_reply() {
        let msg = Message::forget(1, 0);
        assert_eq!(msg.header().unique, 0);
    }

    #[test]
    fn message_len_covers_header_and_arg() {
        let msg = Message::forget(1, 7);
        assert_eq!(msg.header().len as usize, msg.to_bytes().len());
        assert_eq!(msg.arg().len(), mem::size_of::<fuse_forget_in>());
    }
}
