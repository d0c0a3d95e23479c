//! Error types reported by the allocator.

use thiserror::Error;

/// Failure to hand out a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  /// The aligned region cannot hold one minimum block plus the sentinel.
  /// The allocator stays uninitialized. Only `initialize` reports this;
  /// `allocate` reports [`AllocError::OutOfMemory`] instead.
  #[error("arena too small: {available} usable bytes, at least {required} required")]
  ArenaTooSmall {
    /// Bytes between the aligned bounds.
    available: usize,
    /// Bytes needed for a minimum free block and the sentinel header.
    required: usize,
  },

  /// A full circular scan found no free block large enough, or the arena
  /// could not be initialized.
  #[error("out of memory: no free block holds {requested} bytes")]
  OutOfMemory {
    /// The size passed to `allocate`.
    requested: usize,
  },
}

/// Reason a pointer was refused by `try_release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReleaseError {
  #[error("release of {addr:#x} before the arena was initialized")]
  Uninitialized { addr: usize },

  #[error("{addr:#x} lies outside the arena")]
  OutOfBounds { addr: usize },

  #[error("{addr:#x} is not on a header boundary")]
  Misaligned { addr: usize },

  /// Inside the arena and aligned, but no block header precedes it.
  #[error("{addr:#x} is not the payload of any block")]
  UnknownBlock { addr: usize },

  #[error("{addr:#x} is already free")]
  DoubleRelease { addr: usize },
}

/// Corruption found while walking the block chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
  #[error("block at offset {offset} links outside the arena")]
  BrokenChain { offset: usize },

  #[error("block at offset {offset} links backwards to offset {next}")]
  OutOfOrder { offset: usize, next: usize },

  #[error("block at offset {offset} carries {size} bytes, below the minimum")]
  Undersized { offset: usize, size: usize },

  #[error("free blocks at offset {offset} and its successor were not merged")]
  AdjacentFree { offset: usize },

  #[error("sentinel header is corrupted")]
  SentinelCorrupted,

  #[error("search cursor at offset {offset} is not a block header")]
  CursorDetached { offset: usize },
}
