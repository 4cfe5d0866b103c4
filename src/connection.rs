//! Daemon connection state
//!
//! A connection is the shared state of one daemon-facing handle. It is
//! created when the handle is opened and co-owned by the handle's holder and
//! by at most one mounted filesystem instance at a time: each side keeps its
//! own `Arc` share and the connection goes away once the last share is
//! dropped. The mount link itself is guarded by a short non-sleeping lock,
//! since binding and unbinding may run from contexts that must not block.

use parking_lot::Mutex;
use std::io;
use std::{error, fmt};

use crate::message::{Message, Transport};
use crate::mount::MountId;

/// Error type returned when binding an already-bound connection.
#[derive(Debug, Eq, PartialEq)]
pub struct AlreadyBound;

impl fmt::Display for AlreadyBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection is already bound to a mount")
    }
}

impl error::Error for AlreadyBound {}

/// Shared state of one daemon-facing handle.
pub struct Connection {
    /// Transport that queues messages for the daemon.
    transport: Box<dyn Transport>,
    /// The mount currently using this connection, if any. Only the link
    /// mutation is under the lock; handle resolution, message construction
    /// and transport calls all happen outside it.
    mount: Mutex<Option<MountId>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("mount", &self.bound_mount()).finish()
    }
}

impl Connection {
    /// Create the connection for a freshly opened daemon handle.
    pub fn new<T: Transport + 'static>(transport: T) -> Connection {
        Connection { transport: Box::new(transport), mount: Mutex::new(None) }
    }

    /// Bind this connection to the given mount. Fails if another mount is
    /// already using it; the existing binding is left untouched.
    pub fn bind(&self, mount: MountId) -> Result<(), AlreadyBound> {
        let mut bound = self.mount.lock();
        if bound.is_some() {
            return Err(AlreadyBound);
        }
        *bound = Some(mount);
        Ok(())
    }

    /// Clear the mount link. The unbinding mount drops its share of the
    /// connection afterwards, outside the lock.
    pub fn unbind(&self) {
        *self.mount.lock() = None;
    }

    /// The mount currently bound to this connection.
    pub fn bound_mount(&self) -> Option<MountId> {
        *self.mount.lock()
    }

    /// Queue a message for the daemon.
    pub fn send(&self, msg: &Message) -> io::Result<()> {
        self.transport.send(msg)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    #[derive(Debug)]
    struct NullTransport;

    impl Transport for NullTransport {
        fn send(&self, _msg: &Message) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bind_twice_fails() {
        let conn = Connection::new(NullTransport);
        let first = MountId::next();
        assert_eq!(conn.bind(first), Ok(()));
        assert_eq!(conn.bind(MountId::next()), Err(AlreadyBound));
        // The losing bind must not disturb the existing link
        assert_eq!(conn.bound_mount(), Some(first));
    }

    #[test]
    fn rebind_after_unbind() {
        let conn = Connection::new(NullTransport);
        conn.bind(MountId::next()).unwrap();
        conn.unbind();
        assert_eq!(conn.bound_mount(), None);
        let second = MountId::next();
        assert_eq!(conn.bind(second), Ok(()));
        assert_eq!(conn.bound_mount(), Some(second));
    }

    #[test]
    fn concurrent_bind_single_winner() {
        let conn = Arc::new(Connection::new(NullTransport));
        let (tx, rx) = mpsc::channel();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let conn = conn.clone();
                let tx = tx.clone();
                thread::spawn(move || {
                    tx.send(conn.bind(MountId::next()).is_ok()).unwrap();
                })
            })
            .collect();
        drop(tx);
        let wins = rx.iter().filter(|won| *won).count();
        assert_eq!(wins, 1);
        assert!(conn.bound_mount().is_some());
        for thread in threads {
            thread.join().unwrap();
        }
    }
}
