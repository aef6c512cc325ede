//! List anchor for extent descriptor lists.

use crate::common::bytes::{ByteReader, ByteWriter};
use crate::common::Result;

use super::Pointer;

/// Anchor of a doubly-linked list of extent descriptors.
///
/// Holds the list length and pointers to the first and last members. The
/// members themselves carry `prev`/`next` pointers inside the descriptor
/// array.
///
/// Invariant: `len() == 0` exactly when both pointers are null.
///
/// # Layout (18 bytes)
/// ```text
/// Offset  Size  Field
/// 0       2     length (i16)
/// 2       8     first (Pointer)
/// 10      8     last (Pointer)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseNode {
    length: u16,
    first: Pointer,
    last: Pointer,
}

impl BaseNode {
    /// Serialized size in bytes.
    pub const SIZE: usize = 2 + Pointer::SIZE * 2;

    /// An empty list.
    pub const EMPTY: BaseNode = BaseNode {
        length: 0,
        first: Pointer::NULL,
        last: Pointer::NULL,
    };

    pub fn new(length: u16, first: Pointer, last: Pointer) -> Self {
        Self {
            length,
            first,
            last,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_null() && self.last.is_null()
    }

    #[inline]
    pub fn len(&self) -> u16 {
        self.length
    }

    #[inline]
    pub fn first(&self) -> Pointer {
        self.first
    }

    #[inline]
    pub fn last(&self) -> Pointer {
        self.last
    }

    pub(crate) fn set_first(&mut self, pointer: Pointer) {
        self.first = pointer;
    }

    pub(crate) fn set_last(&mut self, pointer: Pointer) {
        self.last = pointer;
    }

    pub(crate) fn increment(&mut self) {
        self.length += 1;
    }

    pub(crate) fn decrement(&mut self) {
        debug_assert!(self.length > 0, "list length underflow");
        self.length -= 1;
    }

    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let length = reader.read_u16()?;
        let first = Pointer::read_from(reader)?;
        let last = Pointer::read_from(reader)?;
        Ok(Self::new(length, first, last))
    }

    pub fn write_to(&self, writer: &mut ByteWriter<'_>) {
        writer.write_u16(self.length);
        self.first.write_to(writer);
        self.last.write_to(writer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(node: BaseNode) -> BaseNode {
        let mut buf = [0u8; BaseNode::SIZE];
        node.write_to(&mut ByteWriter::new(&mut buf));
        BaseNode::read_from(&mut ByteReader::new(&buf)).unwrap()
    }

    #[test]
    fn test_empty_base_node() {
        assert!(BaseNode::EMPTY.is_empty());
        assert_eq!(BaseNode::EMPTY.len(), 0);
        assert_eq!(BaseNode::default(), BaseNode::EMPTY);
    }

    #[test]
    fn test_single_member_is_not_empty() {
        let node = BaseNode::new(1, Pointer::to_entry(0), Pointer::to_entry(0));
        assert!(!node.is_empty());
        assert_eq!(node.first(), node.last());
    }

    #[test]
    fn test_base_node_roundtrip() {
        for node in [
            BaseNode::EMPTY,
            BaseNode::new(255, Pointer::to_entry(27), Pointer::to_entry(27 * 255)),
            BaseNode::new(u16::MAX, Pointer::new(i32::MAX, i32::MAX), Pointer::new(0, 0)),
        ] {
            assert_eq!(roundtrip(node), node);
        }
    }

    #[test]
    fn test_base_node_byte_layout() {
        let node = BaseNode::new(2, Pointer::new(0, 200), Pointer::new(0, 400));
        let mut buf = [0u8; BaseNode::SIZE];
        node.write_to(&mut ByteWriter::new(&mut buf));

        assert_eq!(&buf[0..2], &2u16.to_le_bytes());
        assert_eq!(&buf[6..10], &200i32.to_le_bytes());
        assert_eq!(&buf[14..18], &400i32.to_le_bytes());
    }
}
