//! Extent descriptors: allocation state of 64 consecutive pages.

use crate::common::bytes::{ByteReader, ByteWriter};
use crate::common::config::PAGES_PER_EXTENT;
use crate::common::{Error, Result};

use super::Pointer;

/// Allocation state of an extent, mirrored by the list it belongs to.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtentState {
    /// Some pages allocated, some free.
    FreeFrag = 0,
    /// Every page allocated.
    FullFrag = 1,
    /// No page allocated.
    Free = 2,
}

impl ExtentState {
    /// Convert from the on-disk code.
    ///
    /// # Errors
    /// `Error::UnknownExtentState` for any other byte.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ExtentState::FreeFrag),
            1 => Ok(ExtentState::FullFrag),
            2 => Ok(ExtentState::Free),
            other => Err(Error::UnknownExtentState(other)),
        }
    }
}

/// Bitmap with every page of an extent free.
pub const ALL_FREE: u64 = u64::MAX;

/// Descriptor of one extent.
///
/// `page_bitmap` bit `i` is 1 while page `i` of the extent is free.
///
/// # Invariants
/// - `Free` ⇒ bitmap all ones
/// - `FullFrag` ⇒ bitmap all zeros
/// - `FreeFrag` ⇒ between 1 and 63 free bits
///
/// # Layout (27 bytes)
/// ```text
/// Offset  Size  Field
/// 0       2     extent_number (i16)
/// 2       8     prev (Pointer)
/// 10      8     next (Pointer)
/// 18      1     state (ExtentState as u8)
/// 19      8     page_bitmap (u64)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentDescriptor {
    extent_number: u16,
    prev: Pointer,
    next: Pointer,
    state: ExtentState,
    page_bitmap: u64,
}

impl ExtentDescriptor {
    /// Serialized size in bytes.
    pub const SIZE: usize = 2 + Pointer::SIZE * 2 + 1 + 8;

    /// A fully free, unlinked extent.
    pub fn new(extent_number: u16) -> Self {
        Self {
            extent_number,
            prev: Pointer::NULL,
            next: Pointer::NULL,
            state: ExtentState::Free,
            page_bitmap: ALL_FREE,
        }
    }

    /// Build a descriptor from raw parts. Used by codecs and tests.
    pub fn from_parts(
        extent_number: u16,
        prev: Pointer,
        next: Pointer,
        state: ExtentState,
        page_bitmap: u64,
    ) -> Self {
        Self {
            extent_number,
            prev,
            next,
            state,
            page_bitmap,
        }
    }

    /// Byte offset of descriptor `extent_number` inside the entries array.
    #[inline]
    pub fn offset_of(extent_number: u32) -> usize {
        extent_number as usize * Self::SIZE
    }

    /// Claim the lowest free page. Returns its index within the extent,
    /// or `None` if the extent is full.
    ///
    /// The state moves `Free → FreeFrag` and, once the bitmap empties,
    /// `→ FullFrag`. List membership is the caller's job.
    pub fn allocate_page(&mut self) -> Option<u32> {
        if self.page_bitmap == 0 {
            return None;
        }
        let index = self.page_bitmap.trailing_zeros();
        self.page_bitmap &= !(1u64 << index);

        if self.state == ExtentState::Free {
            self.state = ExtentState::FreeFrag;
        }
        if self.is_fully_allocated() {
            self.state = ExtentState::FullFrag;
        }
        Some(index)
    }

    /// Return page `index` to the extent.
    ///
    /// The state moves `FullFrag → FreeFrag` and, once every bit is set
    /// again, `→ Free`.
    ///
    /// # Errors
    /// `Error::PageNotAllocated` if the page is already free. `global` is
    /// only used to report the error.
    pub fn deallocate_page(&mut self, index: u32, global: u32) -> Result<()> {
        debug_assert!(index < PAGES_PER_EXTENT);
        if self.is_page_free(index) {
            return Err(Error::PageNotAllocated(global));
        }
        self.page_bitmap |= 1u64 << index;

        if self.state == ExtentState::FullFrag {
            self.state = ExtentState::FreeFrag;
        }
        if self.state == ExtentState::FreeFrag && self.is_fully_free() {
            self.state = ExtentState::Free;
        }
        Ok(())
    }

    #[inline]
    pub fn is_page_free(&self, index: u32) -> bool {
        self.page_bitmap & (1u64 << index) != 0
    }

    #[inline]
    pub fn is_fully_allocated(&self) -> bool {
        self.page_bitmap == 0
    }

    #[inline]
    pub fn is_fully_free(&self) -> bool {
        self.page_bitmap == ALL_FREE
    }

    /// Number of free pages.
    #[inline]
    pub fn free_pages(&self) -> u32 {
        self.page_bitmap.count_ones()
    }

    #[inline]
    pub fn extent_number(&self) -> u16 {
        self.extent_number
    }

    #[inline]
    pub fn prev(&self) -> Pointer {
        self.prev
    }

    #[inline]
    pub fn next(&self) -> Pointer {
        self.next
    }

    #[inline]
    pub fn state(&self) -> ExtentState {
        self.state
    }

    #[inline]
    pub fn page_bitmap(&self) -> u64 {
        self.page_bitmap
    }

    pub(crate) fn set_prev(&mut self, pointer: Pointer) {
        self.prev = pointer;
    }

    pub(crate) fn set_next(&mut self, pointer: Pointer) {
        self.next = pointer;
    }

    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let extent_number = reader.read_u16()?;
        let prev = Pointer::read_from(reader)?;
        let next = Pointer::read_from(reader)?;
        let state = ExtentState::from_u8(reader.read_u8()?)?;
        let page_bitmap = reader.read_u64()?;
        Ok(Self::from_parts(extent_number, prev, next, state, page_bitmap))
    }

    pub fn write_to(&self, writer: &mut ByteWriter<'_>) {
        writer.write_u16(self.extent_number);
        self.prev.write_to(writer);
        self.next.write_to(writer);
        writer.write_u8(self.state as u8);
        writer.write_u64(self.page_bitmap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(descriptor: ExtentDescriptor) -> ExtentDescriptor {
        let mut buf = [0u8; ExtentDescriptor::SIZE];
        descriptor.write_to(&mut ByteWriter::new(&mut buf));
        ExtentDescriptor::read_from(&mut ByteReader::new(&buf)).unwrap()
    }

    // --- ExtentState tests ---

    #[test]
    fn test_extent_state_from_u8() {
        assert_eq!(ExtentState::from_u8(0).unwrap(), ExtentState::FreeFrag);
        assert_eq!(ExtentState::from_u8(1).unwrap(), ExtentState::FullFrag);
        assert_eq!(ExtentState::from_u8(2).unwrap(), ExtentState::Free);
        assert!(matches!(
            ExtentState::from_u8(3),
            Err(Error::UnknownExtentState(3))
        ));
    }

    // --- ExtentDescriptor tests ---

    #[test]
    fn test_size() {
        assert_eq!(ExtentDescriptor::SIZE, 27);
        assert_eq!(ExtentDescriptor::offset_of(2), 54);
    }

    #[test]
    fn test_new_extent_is_free() {
        let descriptor = ExtentDescriptor::new(7);
        assert_eq!(descriptor.state(), ExtentState::Free);
        assert!(descriptor.is_fully_free());
        assert_eq!(descriptor.free_pages(), 64);
        assert!(descriptor.prev().is_null());
        assert!(descriptor.next().is_null());
    }

    #[test]
    fn test_allocate_takes_lowest_free_page() {
        let mut descriptor = ExtentDescriptor::new(0);

        assert_eq!(descriptor.allocate_page(), Some(0));
        assert_eq!(descriptor.state(), ExtentState::FreeFrag);
        assert_eq!(descriptor.allocate_page(), Some(1));

        descriptor.deallocate_page(0, 0).unwrap();
        assert_eq!(descriptor.allocate_page(), Some(0));
        assert_eq!(descriptor.allocate_page(), Some(2));
    }

    #[test]
    fn test_fill_and_drain_state_transitions() {
        let mut descriptor = ExtentDescriptor::new(1);

        for expected in 0..PAGES_PER_EXTENT {
            assert_eq!(descriptor.allocate_page(), Some(expected));
        }
        assert_eq!(descriptor.state(), ExtentState::FullFrag);
        assert!(descriptor.is_fully_allocated());
        assert_eq!(descriptor.allocate_page(), None);

        descriptor.deallocate_page(10, 74).unwrap();
        assert_eq!(descriptor.state(), ExtentState::FreeFrag);
        assert_eq!(descriptor.free_pages(), 1);

        for index in (0..PAGES_PER_EXTENT).filter(|&i| i != 10) {
            descriptor.deallocate_page(index, 64 + index).unwrap();
        }
        assert_eq!(descriptor.state(), ExtentState::Free);
        assert!(descriptor.is_fully_free());
    }

    #[test]
    fn test_double_free_is_rejected() {
        let mut descriptor = ExtentDescriptor::new(0);
        assert!(matches!(
            descriptor.deallocate_page(5, 5),
            Err(Error::PageNotAllocated(5))
        ));
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let cases = [
            ExtentDescriptor::new(0),
            ExtentDescriptor::from_parts(0, Pointer::NULL, Pointer::NULL, ExtentState::FullFrag, 0),
            ExtentDescriptor::from_parts(
                255,
                Pointer::to_entry(27 * 254),
                Pointer::NULL,
                ExtentState::FreeFrag,
                0x8000_0000_0000_0001,
            ),
            ExtentDescriptor::from_parts(
                u16::MAX,
                Pointer::new(i32::MAX, i32::MAX),
                Pointer::new(i32::MAX, i32::MAX),
                ExtentState::Free,
                ALL_FREE,
            ),
        ];
        for descriptor in cases {
            assert_eq!(roundtrip(descriptor), descriptor);
        }
    }

    #[test]
    fn test_unknown_state_byte_is_fatal() {
        let mut buf = [0u8; ExtentDescriptor::SIZE];
        ExtentDescriptor::new(3).write_to(&mut ByteWriter::new(&mut buf));
        buf[18] = 9;

        let result = ExtentDescriptor::read_from(&mut ByteReader::new(&buf));
        assert!(matches!(result, Err(Error::UnknownExtentState(9))));
    }
}
