use std::{marker::PhantomData, ptr::NonNull};

use tracing::{trace, warn};

use crate::{
  align,
  arena::Arena,
  block::{Block, HEADER_SIZE, MIN_PAYLOAD, Slot},
  error::{AllocError, HeapError, ReleaseError},
};

/// Next-fit allocator over a caller supplied region.
///
/// Every block, free or used, is chained in address order through its
/// header; the sentinel at the end of the arena links back to the first
/// block. Allocation resumes scanning where the previous one stopped.
pub struct FreeListAllocator<'a> {
  start: NonNull<u8>,
  end: *mut u8,
  arena: Option<Arena>,
  cursor: Slot,
  _region: PhantomData<&'a mut [u8]>,
}

/// A block as seen by [`FreeListAllocator::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// First byte after the header.
  pub payload: NonNull<u8>,
  /// Usable bytes; zero for the sentinel.
  pub size: usize,
  pub free: bool,
}

impl<'a> FreeListAllocator<'a> {
  /// Manages `region`. Nothing is written until the first
  /// [`initialize`](Self::initialize) or [`allocate`](Self::allocate).
  pub fn new(region: &'a mut [u8]) -> Self {
    let range = region.as_mut_ptr_range();

    Self {
      start: NonNull::new(range.start).unwrap_or(NonNull::dangling()),
      end: range.end,
      arena: None,
      cursor: Slot::new(0),
      _region: PhantomData,
    }
  }

  /// Manages the raw range `[start, end)`.
  ///
  /// # Safety
  ///
  /// The range must be valid for reads and writes for `'a` and must not be
  /// accessed through any other path except payloads handed out by this
  /// allocator.
  pub unsafe fn from_raw_bounds(
    start: NonNull<u8>,
    end: *mut u8,
  ) -> Self {
    Self {
      start,
      end,
      arena: None,
      cursor: Slot::new(0),
      _region: PhantomData,
    }
  }

  /// Lays down the first free block and the sentinel. Later calls are no-ops.
  ///
  /// Fails when the aligned region cannot hold one minimum block plus the
  /// sentinel; the allocator then stays uninitialized.
  pub fn initialize(&mut self) -> Result<(), AllocError> {
    self.arena().map(|_| ())
  }

  pub fn is_initialized(&self) -> bool {
    self.arena.is_some()
  }

  /// Aligned `(start, end)` addresses, once initialized.
  pub fn bounds(&self) -> Option<(usize, usize)> {
    self.arena.map(|arena| (arena.start(), arena.end()))
  }

  /// Largest payload a single allocation can ever get.
  pub fn capacity(&self) -> Option<usize> {
    self.arena.map(|arena| arena.capacity())
  }

  fn arena(&mut self) -> Result<Arena, AllocError> {
    if let Some(arena) = self.arena {
      return Ok(arena);
    }

    // Caller of `new`/`from_raw_bounds` vouched for the range.
    let arena = unsafe { Arena::lay_down(self.start, self.end) }?;
    self.arena = Some(arena);
    self.cursor = arena.first();

    Ok(arena)
  }

  /// Returns an 8-byte aligned payload of at least `size` bytes.
  ///
  /// Initializes the arena on first use; an arena too small to initialize
  /// reports [`AllocError::OutOfMemory`] like any other failed request.
  ///
  /// Scans the circular chain starting at the block after the previous
  /// allocation. Free blocks absorb their free successors before they are
  /// measured; a block with enough room left over is split and the remainder
  /// stays free.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let Ok(arena) = self.arena() else {
      return Err(AllocError::OutOfMemory { requested: size });
    };

    if size > arena.capacity() {
      return Err(AllocError::OutOfMemory { requested: size });
    }
    let aligned_size = align!(size).max(MIN_PAYLOAD);

    let mut start = self.cursor;
    let mut current = start;
    let mut lapped = false;

    loop {
      let mut block = arena.read(current);

      if block.is_free() {
        let mut next = arena.read(block.next());
        while next.is_free() {
          let absorbed = block.next();
          trace!(at = current.offset(), absorbed = absorbed.offset(), "coalesce");
          if absorbed == start {
            start = current;
            lapped = true;
          }
          block.set_next(next.next());
          next = arena.read(block.next());
        }
        arena.write(current, block);

        let available = block.size(current);
        if available >= aligned_size {
          if available - aligned_size >= HEADER_SIZE + MIN_PAYLOAD {
            let split = Slot::from_offset(current.offset() + HEADER_SIZE + aligned_size);
            arena.write(split, Block::new(block.next(), true));
            block.set_next(split);
            trace!(at = current.offset(), split = split.offset(), "split");
          }

          block.set_free(false);
          arena.write(current, block);
          self.cursor = block.next();

          let payload = arena.payload(current);
          trace!(
            requested = size,
            size = block.size(current),
            at = current.offset(),
            "allocate"
          );
          return Ok(payload);
        }
      }

      current = block.next();
      if current == start || lapped {
        break;
      }
    }

    self.cursor = start;
    trace!(requested = size, "out of memory");
    Err(AllocError::OutOfMemory { requested: size })
  }

  /// Gives a payload back. Invalid and repeated releases are ignored.
  pub fn release(
    &mut self,
    ptr: NonNull<u8>,
  ) {
    if let Err(err) = self.try_release(ptr) {
      warn!(%err, "ignored release");
    }
  }

  /// Gives a payload back, merging the block with free neighbors on both
  /// sides.
  ///
  /// The pointer must be exactly one previously returned by
  /// [`allocate`](Self::allocate); anything else is refused without
  /// touching the heap.
  pub fn try_release(
    &mut self,
    ptr: NonNull<u8>,
  ) -> Result<(), ReleaseError> {
    let addr = ptr.as_ptr().addr();
    let arena = self.arena.ok_or(ReleaseError::Uninitialized { addr })?;

    let slot = arena.slot_of(ptr)?;
    let prev = self
      .predecessor(&arena, slot)
      .ok_or(ReleaseError::UnknownBlock { addr })?;

    let mut block = arena.read(slot);
    if block.is_free() {
      return Err(ReleaseError::DoubleRelease { addr });
    }
    block.set_free(true);

    let next = arena.read(block.next());
    if next.is_free() {
      if self.cursor == block.next() {
        self.cursor = slot;
      }
      block.set_next(next.next());
    }
    arena.write(slot, block);

    let mut prev_block = arena.read(prev);
    if prev_block.is_free() {
      prev_block.set_next(block.next());
      arena.write(prev, prev_block);
      if self.cursor == slot {
        self.cursor = prev;
      }
    }

    trace!(at = slot.offset(), "release");
    Ok(())
  }

  /// Header whose successor is `slot`, found by walking from the first block.
  /// `None` when no header starts at `slot`.
  fn predecessor(
    &self,
    arena: &Arena,
    slot: Slot,
  ) -> Option<Slot> {
    let mut current = arena.first();

    loop {
      let block = arena.read(current);
      if block.next() == slot {
        return Some(current);
      }
      if current == arena.sentinel() || block.next() <= current {
        return None;
      }
      current = block.next();
    }
  }

  /// Walks all blocks in address order, sentinel last.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      arena: self.arena,
      current: self.arena.map(|arena| arena.first()),
      _heap: PhantomData,
    }
  }

  /// Verifies the chain: circular, ascending, sizes at least the minimum,
  /// no unmerged free neighbors, intact sentinel and a live cursor.
  pub fn check(&self) -> Result<(), HeapError> {
    let Some(arena) = self.arena else {
      return Ok(());
    };

    let sentinel = arena.sentinel();
    let mut current = arena.first();
    let mut previous_free = false;
    let mut cursor_seen = false;

    while current != sentinel {
      let block = arena.read(current);
      let next = block.next();
      let offset = current.offset();

      if !arena.contains(next) {
        return Err(HeapError::BrokenChain { offset });
      }
      if next <= current {
        return Err(HeapError::OutOfOrder {
          offset,
          next: next.offset(),
        });
      }

      let size = block.size(current);
      if size < MIN_PAYLOAD {
        return Err(HeapError::Undersized { offset, size });
      }
      if previous_free && block.is_free() {
        return Err(HeapError::AdjacentFree { offset });
      }

      previous_free = block.is_free();
      cursor_seen |= current == self.cursor;
      current = next;
    }

    let block = arena.read(sentinel);
    if block.is_free() || block.next() != arena.first() {
      return Err(HeapError::SentinelCorrupted);
    }
    cursor_seen |= self.cursor == sentinel;

    if !cursor_seen {
      return Err(HeapError::CursorDetached {
        offset: self.cursor.offset(),
      });
    }

    Ok(())
  }
}

/// Iterator returned by [`FreeListAllocator::blocks`].
pub struct Blocks<'h> {
  arena: Option<Arena>,
  current: Option<Slot>,
  _heap: PhantomData<&'h ()>,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    let arena = self.arena?;
    let current = self.current?;

    let block = arena.read(current);
    self.current = (current != arena.sentinel() && block.next() > current).then(|| block.next());

    Some(BlockInfo {
      payload: arena.payload(current),
      size: block.size(current),
      free: block.is_free(),
    })
  }
}
