use std::mem;

use crate::align::ALIGNMENT;

/// Bytes occupied by a [`Block`] header in front of every payload.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

/// Smallest payload a block may carry (the sentinel excepted).
pub const MIN_PAYLOAD: usize = 8;

const _: () = assert!(HEADER_SIZE == ALIGNMENT);

/// Index of an 8-byte word relative to the aligned arena start.
///
/// Every header sits on a slot boundary, so a slot doubles as the identity
/// of the block whose header starts there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u32);

impl Slot {
  pub const fn new(index: u32) -> Self {
    Self(index)
  }

  pub const fn index(self) -> u32 {
    self.0
  }

  /// Byte offset of the slot from the aligned arena start.
  pub const fn offset(self) -> usize {
    self.0 as usize * ALIGNMENT
  }

  /// Slot starting `offset` bytes after the arena start.
  /// `offset` must be a multiple of [`ALIGNMENT`] that fits the arena.
  pub fn from_offset(offset: usize) -> Self {
    debug_assert_eq!(offset % ALIGNMENT, 0);
    Self((offset / ALIGNMENT) as u32)
  }

  /// Slot of the payload that follows this header.
  pub fn payload(self) -> Self {
    Self(self.0 + (HEADER_SIZE / ALIGNMENT) as u32)
  }
}

/// Header written in front of every block inside the arena.
///
/// `next` is the slot of the following block in address order (free or not);
/// the last block wraps back to the first. The free flag lives in its own
/// field instead of a tag bit in `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, align(8))]
pub struct Block {
  next: u32,
  free: u32,
}

impl Block {
  pub fn new(
    next: Slot,
    is_free: bool,
  ) -> Self {
    Self {
      next: next.0,
      free: is_free as u32,
    }
  }

  pub fn next(&self) -> Slot {
    Slot(self.next)
  }

  /// Relinks the block, keeping its free flag.
  pub fn set_next(
    &mut self,
    next: Slot,
  ) {
    self.next = next.0;
  }

  pub fn is_free(&self) -> bool {
    self.free != 0
  }

  pub fn set_free(
    &mut self,
    is_free: bool,
  ) {
    self.free = is_free as u32;
  }

  /// Payload bytes of the block whose header sits at `at`.
  ///
  /// Derived from the distance to the successor; the sentinel, whose
  /// successor wraps to a lower slot, reports zero.
  pub fn size(
    &self,
    at: Slot,
  ) -> usize {
    self
      .next()
      .offset()
      .saturating_sub(at.offset() + HEADER_SIZE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_layout() {
    assert_eq!(HEADER_SIZE, 8);
    assert_eq!(mem::align_of::<Block>(), ALIGNMENT);
  }

  #[test]
  fn test_set_next_keeps_flag() {
    let mut block = Block::new(Slot::new(4), true);

    block.set_next(Slot::new(9));

    assert!(block.is_free());
    assert_eq!(block.next(), Slot::new(9));

    block.set_free(false);
    block.set_next(Slot::new(2));

    assert!(!block.is_free());
    assert_eq!(block.next(), Slot::new(2));
  }

  #[test]
  fn test_size() {
    let block = Block::new(Slot::new(4), true);
    assert_eq!(block.size(Slot::new(0)), 24);
    assert_eq!(block.size(Slot::new(3)), 0);

    let sentinel = Block::new(Slot::new(0), false);
    assert_eq!(sentinel.size(Slot::new(31)), 0);
  }

  #[test]
  fn test_slot_offsets() {
    assert_eq!(Slot::new(3).offset(), 24);
    assert_eq!(Slot::from_offset(40), Slot::new(5));
    assert_eq!(Slot::new(5).payload(), Slot::new(6));
  }
}
