use std::ptr::NonNull;

use tracing::debug;

use crate::{
  align::ALIGNMENT,
  align_down,
  block::{Block, HEADER_SIZE, MIN_PAYLOAD, Slot},
  error::{AllocError, ReleaseError},
};

/// Smallest aligned range able to hold one minimum free block and the sentinel.
pub const MIN_ARENA: usize = 2 * HEADER_SIZE + MIN_PAYLOAD;

/// Aligned bounds of the region the allocator manages.
///
/// ```text
///   aligned start                                        aligned end
///   │                                                              │
///   ▼                                                              ▼
///   ┌────────┬───────────────────────────────────────────┬────────┐
///   │ first  │          payload (capacity bytes)         │sentinel│
///   │ free   │                                           │ used   │
///   └────────┴───────────────────────────────────────────┴────────┘
///     slot 0                                              slot n-1
///       │                                                   ▲  │
///       └───────────────────── next ────────────────────────┘  │
///       ▲                                                      │
///       └──────────────────────── next ────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Arena {
  base: NonNull<u8>,
  slots: u32,
}

impl Arena {
  /// Aligns `[start, end)` inward to [`ALIGNMENT`] and writes the initial
  /// free block and sentinel headers.
  ///
  /// # Safety
  ///
  /// `[start, end)` must be valid for reads and writes and must not be
  /// accessed other than through the returned arena while it is in use.
  pub unsafe fn lay_down(
    start: NonNull<u8>,
    end: *mut u8,
  ) -> Result<Self, AllocError> {
    let start_addr = start.as_ptr().addr();
    let offset = start.as_ptr().align_offset(ALIGNMENT);

    let aligned_end = align_down!(end.addr());
    let available = match start_addr.checked_add(offset) {
      Some(aligned_start) if offset < ALIGNMENT => aligned_end.saturating_sub(aligned_start),
      _ => 0,
    };

    if available < MIN_ARENA {
      debug!(start = start_addr, end = end.addr(), available, "arena too small");
      return Err(AllocError::ArenaTooSmall {
        available,
        required: MIN_ARENA,
      });
    }

    let slots = (available / ALIGNMENT).min(u32::MAX as usize) as u32;

    // offset < ALIGNMENT <= available, so the aligned start is inside the region.
    let base = unsafe { NonNull::new_unchecked(start.as_ptr().add(offset)) };
    let arena = Self { base, slots };

    let first = arena.first();
    let sentinel = arena.sentinel();
    arena.write(first, Block::new(sentinel, true));
    arena.write(sentinel, Block::new(first, false));

    debug!(
      start = arena.start(),
      end = arena.end(),
      capacity = arena.capacity(),
      "arena initialized"
    );

    Ok(arena)
  }

  pub fn first(&self) -> Slot {
    Slot::new(0)
  }

  pub fn sentinel(&self) -> Slot {
    Slot::new(self.slots - 1)
  }

  /// Aligned start address.
  pub fn start(&self) -> usize {
    self.base.as_ptr().addr()
  }

  /// Aligned end address (exclusive).
  pub fn end(&self) -> usize {
    self.start() + self.slots as usize * ALIGNMENT
  }

  /// Payload bytes of the single free block laid down at initialization.
  pub fn capacity(&self) -> usize {
    self.slots as usize * ALIGNMENT - 2 * HEADER_SIZE
  }

  pub fn contains(
    &self,
    slot: Slot,
  ) -> bool {
    slot.index() < self.slots
  }

  pub fn read(
    &self,
    slot: Slot,
  ) -> Block {
    debug_assert!(self.contains(slot));
    unsafe { self.base.as_ptr().add(slot.offset()).cast::<Block>().read() }
  }

  /// Places a fresh header at `slot`; whatever the bytes held before is lost.
  pub fn write(
    &self,
    slot: Slot,
    block: Block,
  ) {
    debug_assert!(self.contains(slot));
    unsafe {
      self
        .base
        .as_ptr()
        .add(slot.offset())
        .cast::<Block>()
        .write(block)
    }
  }

  /// Address of the payload following the header at `slot`.
  pub fn payload(
    &self,
    slot: Slot,
  ) -> NonNull<u8> {
    debug_assert!(self.contains(slot));
    unsafe { self.base.add(slot.payload().offset()) }
  }

  /// Maps a payload address back to the slot of its header.
  ///
  /// Only checks bounds and alignment; the caller decides whether a header
  /// really lives there.
  pub fn slot_of(
    &self,
    ptr: NonNull<u8>,
  ) -> Result<Slot, ReleaseError> {
    let addr = ptr.as_ptr().addr();

    if addr < self.start() + HEADER_SIZE || addr >= self.end() {
      return Err(ReleaseError::OutOfBounds { addr });
    }

    let offset = addr - self.start();
    if offset % ALIGNMENT != 0 {
      return Err(ReleaseError::Misaligned { addr });
    }

    Ok(Slot::from_offset(offset - HEADER_SIZE))
  }
}
