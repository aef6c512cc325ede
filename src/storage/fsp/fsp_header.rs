//! File-space header: page 0 of every table space.
//!
//! The header owns the 256 extent descriptors of the space, serialized
//! back-to-back in a flat `entries` array, and threads them through three
//! intrusive doubly-linked lists:
//!
//! ```text
//! free       extents with every page free
//! free_frag  extents with some pages allocated
//! full_frag  extents with every page allocated
//! ```
//!
//! List links are [`Pointer`]s holding byte offsets into `entries`, so the
//! whole structure stays a plain byte image that can be written to disk as is.

use log::{debug, trace};

use crate::common::bytes::{ByteReader, ByteWriter};
use crate::common::config::{MAX_PAGES_PER_SPACE, PAGES_PER_EXTENT, PAGE_SIZE, TOTAL_EXTENTS};
use crate::common::{Error, Result};
use crate::storage::page::{FileHeader, PageType};

use super::{BaseNode, ExtentDescriptor, ExtentState, Pointer, ALL_FREE};

/// Size of the descriptor array: everything after the fixed header fields.
pub const ENTRIES_SIZE: usize = PAGE_SIZE - (FileHeader::SIZE + 4 + 4 + BaseNode::SIZE * 3);

/// Bytes of `entries` actually occupied by descriptors.
const DESCRIPTORS_SIZE: usize = TOTAL_EXTENTS as usize * ExtentDescriptor::SIZE;

/// The page number the header itself occupies.
pub const FSP_HEADER_PAGE: u32 = 0;

/// Names one of the three extent lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtentList {
    Free,
    FreeFrag,
    FullFrag,
}

impl ExtentList {
    /// The extent state that membership in this list implies.
    pub fn state(self) -> ExtentState {
        match self {
            ExtentList::Free => ExtentState::Free,
            ExtentList::FreeFrag => ExtentState::FreeFrag,
            ExtentList::FullFrag => ExtentState::FullFrag,
        }
    }
}

/// File-space header.
///
/// # Layout
/// ```text
/// Offset  Size          Field
/// 0       13            FileHeader
/// 13      4             space_id (i32)
/// 17      4             size (i32)
/// 21      18            free_frag (BaseNode)
/// 39      18            full_frag (BaseNode)
/// 57      18            free (BaseNode)
/// 75      ENTRIES_SIZE  entries (descriptor i at offset i × 27)
/// ```
///
/// # Page numbering
/// Extents and bits are zero-based: global page `n` is bit `n % 64` of
/// extent `n / 64`. Page 0 is the header itself, so a new space starts with
/// extent 0 on the `free_frag` list and bit 0 already taken.
///
/// # Dirty tracking
/// Every allocation or deallocation marks the header dirty. The flag lives
/// only in memory; a header read from disk is clean.
#[derive(Debug, Clone)]
pub struct FspHeader {
    file_header: FileHeader,
    space_id: u32,
    size: u32,
    free_frag: BaseNode,
    full_frag: BaseNode,
    free: BaseNode,
    entries: Box<[u8]>,
    dirty: bool,
}

impl FspHeader {
    /// Initialise a new file space.
    ///
    /// All 256 descriptors are written, extent 0 is placed on `free_frag`
    /// with the header page reserved, and extents 1..=255 go on `free` in
    /// ascending order.
    pub fn new(space_id: u32) -> Self {
        let mut header = Self {
            file_header: FileHeader::new(PageType::FspHeader, FSP_HEADER_PAGE),
            space_id,
            size: 0,
            free_frag: BaseNode::EMPTY,
            full_frag: BaseNode::EMPTY,
            free: BaseNode::EMPTY,
            entries: vec![0u8; ENTRIES_SIZE].into_boxed_slice(),
            dirty: false,
        };

        // Extent 0 alone on free_frag, with the header page taken.
        let first = Self::pointer_for_extent(0);
        let mut reserved = ExtentDescriptor::new(0);
        reserved.allocate_page();
        header.store_descriptor(first, &reserved);
        header.free_frag = BaseNode::new(1, first, first);

        // Extents 1..=255 chained in ascending order on free.
        let last_extent = TOTAL_EXTENTS - 1;
        for extent_number in 1..TOTAL_EXTENTS {
            let prev = if extent_number > 1 {
                Self::pointer_for_extent(extent_number - 1)
            } else {
                Pointer::NULL
            };
            let next = if extent_number < last_extent {
                Self::pointer_for_extent(extent_number + 1)
            } else {
                Pointer::NULL
            };
            let descriptor = ExtentDescriptor::from_parts(
                extent_number as u16,
                prev,
                next,
                ExtentState::Free,
                ALL_FREE,
            );
            header.store_descriptor(Self::pointer_for_extent(extent_number), &descriptor);
        }
        header.free = BaseNode::new(
            last_extent as u16,
            Self::pointer_for_extent(1),
            Self::pointer_for_extent(last_extent),
        );

        header.size = FSP_HEADER_PAGE + 1;
        header
    }

    /// Build a header from raw parts. The entries array must be
    /// `ENTRIES_SIZE` bytes long.
    ///
    /// # Errors
    /// `Error::Corrupted` on a wrongly sized entries array.
    pub fn from_parts(
        file_header: FileHeader,
        space_id: u32,
        size: u32,
        free_frag: BaseNode,
        full_frag: BaseNode,
        free: BaseNode,
        entries: Vec<u8>,
    ) -> Result<Self> {
        if entries.len() != ENTRIES_SIZE {
            return Err(Error::Corrupted(format!(
                "FSP entries must be {} bytes, got {}",
                ENTRIES_SIZE,
                entries.len()
            )));
        }
        Ok(Self {
            file_header,
            space_id,
            size,
            free_frag,
            full_frag,
            free,
            entries: entries.into_boxed_slice(),
            dirty: false,
        })
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Allocate the lowest free page of the first partially used extent,
    /// falling back to the first free extent.
    ///
    /// Returns the global page number `extent × 64 + bit`.
    ///
    /// # Errors
    /// - `Error::SpaceFull` if no extent has a free page
    /// - `Error::Corrupted` if the lists and descriptors disagree
    pub fn allocate_page(&mut self) -> Result<u32> {
        let (list, pointer) = if !self.free_frag.is_empty() {
            (ExtentList::FreeFrag, self.free_frag.first())
        } else if !self.free.is_empty() {
            (ExtentList::Free, self.free.first())
        } else {
            return Err(Error::SpaceFull);
        };

        let mut descriptor = self.read_descriptor(pointer)?;
        let index = descriptor.allocate_page().ok_or_else(|| {
            Error::Corrupted(format!(
                "extent {} is on the {:?} list but has no free page",
                descriptor.extent_number(),
                list
            ))
        })?;
        self.write_descriptor(pointer, &descriptor)?;

        if list == ExtentList::Free {
            self.move_extent(pointer, ExtentList::Free, ExtentList::FreeFrag)?;
        }
        if descriptor.is_fully_allocated() {
            self.move_extent(pointer, ExtentList::FreeFrag, ExtentList::FullFrag)?;
        }

        let page_number = u32::from(descriptor.extent_number()) * PAGES_PER_EXTENT + index;
        self.size = self.size.max(page_number + 1);
        self.dirty = true;

        trace!("space {}: allocated page {}", self.space_id, page_number);
        Ok(page_number)
    }

    /// Return a page to its extent.
    ///
    /// # Errors
    /// - `Error::InvalidPageNumber` for the header page or a page beyond the space
    /// - `Error::PageNotAllocated` if the page is already free
    pub fn deallocate_page(&mut self, page_number: u32) -> Result<()> {
        if page_number == FSP_HEADER_PAGE || page_number >= MAX_PAGES_PER_SPACE {
            return Err(Error::InvalidPageNumber(page_number));
        }

        let extent_number = page_number / PAGES_PER_EXTENT;
        let index = page_number % PAGES_PER_EXTENT;
        let pointer = Self::pointer_for_extent(extent_number);

        let mut descriptor = self.read_descriptor(pointer)?;
        let was = descriptor.state();
        descriptor.deallocate_page(index, page_number)?;
        self.write_descriptor(pointer, &descriptor)?;

        if was == ExtentState::FullFrag {
            self.move_extent(pointer, ExtentList::FullFrag, ExtentList::FreeFrag)?;
        }
        if descriptor.state() == ExtentState::Free {
            self.move_extent(pointer, ExtentList::FreeFrag, ExtentList::Free)?;
        }

        if page_number + 1 == self.size {
            self.size = self
                .highest_allocated_page(extent_number)?
                .map_or(0, |highest| highest + 1);
        }
        self.dirty = true;

        trace!("space {}: deallocated page {}", self.space_id, page_number);
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Read descriptor `extent_number`.
    ///
    /// # Errors
    /// `Error::InvalidPageNumber` if the extent does not exist.
    pub fn extent(&self, extent_number: u32) -> Result<ExtentDescriptor> {
        if extent_number >= TOTAL_EXTENTS {
            return Err(Error::InvalidPageNumber(extent_number * PAGES_PER_EXTENT));
        }
        self.read_descriptor(Self::pointer_for_extent(extent_number))
    }

    /// Whether global page `page_number` is currently allocated.
    pub fn is_page_allocated(&self, page_number: u32) -> Result<bool> {
        if page_number >= MAX_PAGES_PER_SPACE {
            return Err(Error::InvalidPageNumber(page_number));
        }
        let descriptor = self.extent(page_number / PAGES_PER_EXTENT)?;
        Ok(!descriptor.is_page_free(page_number % PAGES_PER_EXTENT))
    }

    /// Number of allocated pages in the space, the header page included.
    pub fn allocated_pages(&self) -> Result<u32> {
        let mut total = 0;
        for extent_number in 0..TOTAL_EXTENTS {
            total += PAGES_PER_EXTENT - self.extent(extent_number)?.free_pages();
        }
        Ok(total)
    }

    /// Extent numbers on `list`, walked from `first` along `next` links.
    ///
    /// # Errors
    /// `Error::Corrupted` if the walk exceeds the number of extents (a cycle)
    /// or hits a bad pointer.
    pub fn list_members(&self, list: ExtentList) -> Result<Vec<u16>> {
        let mut members = Vec::new();
        let mut pointer = self.anchor(list).first();
        while !pointer.is_null() {
            if members.len() >= TOTAL_EXTENTS as usize {
                return Err(Error::Corrupted(format!("cycle in {:?} extent list", list)));
            }
            let descriptor = self.read_descriptor(pointer)?;
            members.push(descriptor.extent_number());
            pointer = descriptor.next();
        }
        Ok(members)
    }

    /// Anchor of `list`.
    pub fn anchor(&self, list: ExtentList) -> &BaseNode {
        match list {
            ExtentList::Free => &self.free,
            ExtentList::FreeFrag => &self.free_frag,
            ExtentList::FullFrag => &self.full_frag,
        }
    }

    #[inline]
    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    #[inline]
    pub fn space_id(&self) -> u32 {
        self.space_id
    }

    /// Highest allocated global page number + 1.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn free(&self) -> &BaseNode {
        &self.free
    }

    #[inline]
    pub fn free_frag(&self) -> &BaseNode {
        &self.free_frag
    }

    #[inline]
    pub fn full_frag(&self) -> &BaseNode {
        &self.full_frag
    }

    #[inline]
    pub fn entries(&self) -> &[u8] {
        &self.entries
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Read a full FSP header page, file header included.
    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let file_header = FileHeader::read_from(reader)?;
        let space_id = reader.read_u32()?;
        let size = reader.read_u32()?;
        let free_frag = BaseNode::read_from(reader)?;
        let full_frag = BaseNode::read_from(reader)?;
        let free = BaseNode::read_from(reader)?;
        let entries = reader.read_bytes(ENTRIES_SIZE)?.to_vec();

        Self::from_parts(file_header, space_id, size, free_frag, full_frag, free, entries)
    }

    /// Write the full page image, file header included.
    pub fn write_to(&self, writer: &mut ByteWriter<'_>) {
        self.file_header.write_to(writer);
        writer.write_u32(self.space_id);
        writer.write_u32(self.size);
        self.free_frag.write_to(writer);
        self.full_frag.write_to(writer);
        self.free.write_to(writer);
        writer.write_bytes(&self.entries);
    }

    // ========================================================================
    // Internal: descriptor arena
    // ========================================================================

    fn pointer_for_extent(extent_number: u32) -> Pointer {
        Pointer::to_entry(ExtentDescriptor::offset_of(extent_number))
    }

    /// Resolve a pointer to a byte range inside `entries`.
    fn entry_offset(&self, pointer: Pointer) -> Result<usize> {
        let offset = pointer.offset();
        let valid = !pointer.is_null()
            && pointer.page_number() == FSP_HEADER_PAGE as i32
            && offset >= 0
            && offset as usize % ExtentDescriptor::SIZE == 0
            && offset as usize + ExtentDescriptor::SIZE <= DESCRIPTORS_SIZE;
        if !valid {
            return Err(Error::Corrupted(format!("bad extent pointer {}", pointer)));
        }
        Ok(offset as usize)
    }

    fn read_descriptor(&self, pointer: Pointer) -> Result<ExtentDescriptor> {
        let offset = self.entry_offset(pointer)?;
        ExtentDescriptor::read_from(&mut ByteReader::new(
            &self.entries[offset..offset + ExtentDescriptor::SIZE],
        ))
    }

    fn write_descriptor(&mut self, pointer: Pointer, descriptor: &ExtentDescriptor) -> Result<()> {
        let offset = self.entry_offset(pointer)?;
        descriptor.write_to(&mut ByteWriter::new(
            &mut self.entries[offset..offset + ExtentDescriptor::SIZE],
        ));
        Ok(())
    }

    /// Infallible write for pointers built from a valid extent number.
    fn store_descriptor(&mut self, pointer: Pointer, descriptor: &ExtentDescriptor) {
        let offset = pointer.offset() as usize;
        descriptor.write_to(&mut ByteWriter::new(
            &mut self.entries[offset..offset + ExtentDescriptor::SIZE],
        ));
    }

    fn anchor_mut(&mut self, list: ExtentList) -> &mut BaseNode {
        match list {
            ExtentList::Free => &mut self.free,
            ExtentList::FreeFrag => &mut self.free_frag,
            ExtentList::FullFrag => &mut self.full_frag,
        }
    }

    // ========================================================================
    // Internal: list primitives
    // ========================================================================

    fn move_extent(&mut self, pointer: Pointer, from: ExtentList, to: ExtentList) -> Result<()> {
        self.unlink(from, pointer)?;
        self.link_last(to, pointer)?;
        debug!(
            "space {}: extent at {} moved {:?} -> {:?}",
            self.space_id, pointer, from, to
        );
        Ok(())
    }

    /// Remove the descriptor at `pointer` from `list`, wherever it sits.
    fn unlink(&mut self, list: ExtentList, pointer: Pointer) -> Result<()> {
        let mut descriptor = self.read_descriptor(pointer)?;
        let prev = descriptor.prev();
        let next = descriptor.next();
        let mut anchor = *self.anchor(list);

        if prev.is_null() {
            if anchor.first() != pointer {
                return Err(Error::Corrupted(format!(
                    "extent at {} has no predecessor but is not first on {:?}",
                    pointer, list
                )));
            }
            anchor.set_first(next);
        } else {
            let mut prev_descriptor = self.read_descriptor(prev)?;
            prev_descriptor.set_next(next);
            self.write_descriptor(prev, &prev_descriptor)?;
        }

        if next.is_null() {
            anchor.set_last(prev);
        } else {
            let mut next_descriptor = self.read_descriptor(next)?;
            next_descriptor.set_prev(prev);
            self.write_descriptor(next, &next_descriptor)?;
        }

        anchor.decrement();
        *self.anchor_mut(list) = anchor;

        descriptor.set_prev(Pointer::NULL);
        descriptor.set_next(Pointer::NULL);
        self.write_descriptor(pointer, &descriptor)
    }

    /// Append the (unlinked) descriptor at `pointer` to the tail of `list`.
    fn link_last(&mut self, list: ExtentList, pointer: Pointer) -> Result<()> {
        let mut descriptor = self.read_descriptor(pointer)?;
        let mut anchor = *self.anchor(list);
        let last = anchor.last();

        if last.is_null() {
            anchor.set_first(pointer);
        } else {
            let mut last_descriptor = self.read_descriptor(last)?;
            last_descriptor.set_next(pointer);
            self.write_descriptor(last, &last_descriptor)?;
        }

        descriptor.set_prev(last);
        descriptor.set_next(Pointer::NULL);
        self.write_descriptor(pointer, &descriptor)?;

        anchor.set_last(pointer);
        anchor.increment();
        *self.anchor_mut(list) = anchor;
        Ok(())
    }

    /// Highest allocated page in extents `0..=from_extent`.
    fn highest_allocated_page(&self, from_extent: u32) -> Result<Option<u32>> {
        for extent_number in (0..=from_extent).rev() {
            let allocated = !self.extent(extent_number)?.page_bitmap();
            if allocated != 0 {
                let bit = 63 - allocated.leading_zeros();
                return Ok(Some(extent_number * PAGES_PER_EXTENT + bit));
            }
        }
        Ok(None)
    }
}

/// Equality ignores the in-memory dirty flag.
impl PartialEq for FspHeader {
    fn eq(&self, other: &Self) -> bool {
        self.file_header == other.file_header
            && self.space_id == other.space_id
            && self.size == other.size
            && self.free_frag == other.free_frag
            && self.full_frag == other.full_frag
            && self.free == other.free
            && self.entries == other.entries
    }
}

impl Eq for FspHeader {}
