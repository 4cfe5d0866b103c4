//! Argument decomposition of raw byte records
//!
//! The calling layer hands us kernel data structures as plain byte buffers.
//! This module provides a little iterator to fetch typed values out of such
//! a buffer, rejecting buffers that are too short to hold what was asked for.

use std::mem;

/// An iterator that fetches typed arguments from a byte slice
pub struct ArgumentIterator<'a> {
    data: &'a [u8],
}

impl<'a> ArgumentIterator<'a> {
    /// Create a new argument iterator for the given byte slice
    pub fn new(data: &'a [u8]) -> ArgumentIterator<'a> {
        ArgumentIterator { data }
    }

    /// Fetch a typed argument. Returns `None` if the remaining bytes are too
    /// short to hold a value of the requested type.
    pub fn fetch<T: Copy>(&mut self) -> Option<T> {
        if self.data.len() < mem::size_of::<T>() {
            return None;
        }
        // The buffer carries no alignment guarantee, so copy the value out.
        let value = unsafe { (self.data.as_ptr() as *const T).read_unaligned() };
        self.data = &self.data[mem::size_of::<T>()..];
        Some(value)
    }

    /// Fetch the remaining bytes
    pub fn fetch_data(&mut self) -> &'a [u8] {
        let data = self.data;
        self.data = &[];
        data
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TEST_DATA: [u8; 10] = [0x12, 0x34, 0x78, 0x56, 0x66, 0x6f, 0x6f, 0x00, 0x62, 0x61];

    #[repr(C)]
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct TestArgument {
        p1: u8,
        p2: u8,
        p3: u16,
    }

    #[test]
    #[cfg(target_endian = "little")]
    fn fetch_typed() {
        let mut it = ArgumentIterator::new(&TEST_DATA);
        let arg: TestArgument = it.fetch().unwrap();
        assert_eq!(arg, TestArgument { p1: 0x12, p2: 0x34, p3: 0x5678 });
    }

    #[test]
    fn fetch_short_buffer() {
        let mut it = ArgumentIterator::new(&TEST_DATA[..3]);
        let arg: Option<TestArgument> = it.fetch();
        assert_eq!(arg, None);
    }

    #[test]
    fn fetch_remaining_data() {
        let mut it = ArgumentIterator::new(&TEST_DATA);
        let _: TestArgument = it.fetch().unwrap();
        assert_eq!(it.fetch_data(), &TEST_DATA[4..]);
        assert!(it.fetch_data().is_empty());
    }
}
