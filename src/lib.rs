//! # nextfit - A Next-Fit Free-List Allocator
//!
//! This crate manages a single, fixed byte region handed in by the caller
//! with a **next-fit free-list allocator**. The region never grows and is
//! never obtained from the operating system.
//!
//! ## Overview
//!
//! Every block, free or used, starts with an 8-byte header. The headers form
//! a circular, singly linked chain in address order; a permanently used
//! sentinel at the end of the arena links back to the first block:
//!
//! ```text
//!   Arena:
//!
//!   ┌────┬────────┬────┬────────┬────┬──────────────────────────┬────┐
//!   │ H  │  used  │ H  │  free  │ H  │          free            │ S  │
//!   └────┴────────┴────┴────────┴────┴──────────────────────────┴────┘
//!     │             ▲ │           ▲ │                           ▲ │
//!     └─────────────┘ └───────────┘ └───────────────────────────┘ │
//!     ▲                                                           │
//!     └───────────────────────────────────────────────────────────┘
//!
//!   H = header { next, free }      S = sentinel (zero payload, used)
//! ```
//!
//! A block's size is never stored: it is the distance from the end of its
//! header to the next header.
//!
//! ## Crate Structure
//!
//! ```text
//!   nextfit
//!   ├── align      - Alignment macros (align!, align_down!)
//!   ├── arena      - Aligned bounds and header slots (internal)
//!   ├── block      - Block header and slot index (internal)
//!   ├── error      - AllocError, ReleaseError, HeapError
//!   └── heap       - FreeListAllocator implementation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use nextfit::FreeListAllocator;
//!
//! let mut words = [0u64; 32];
//! let region = unsafe {
//!     std::slice::from_raw_parts_mut(words.as_mut_ptr().cast::<u8>(), 256)
//! };
//! let mut heap = FreeListAllocator::new(region);
//!
//! let a = heap.allocate(8).unwrap();
//! let b = heap.allocate(8).unwrap();
//! assert_eq!(b.as_ptr().addr(), a.as_ptr().addr() + 16);
//!
//! unsafe { a.cast::<u64>().write(42) };
//!
//! heap.release(a);
//! heap.release(b);
//! heap.check().unwrap();
//! ```
//!
//! ## How It Works
//!
//! Allocation rounds the request up to a multiple of 8 (at least 8) and
//! scans the chain starting at the block after the previous allocation:
//!
//! ```text
//!   allocate(24) with the cursor on F1:
//!
//!   ┌───┬──────┬───┬──────┬───┬──────┬───┬────────────────────┬───┐
//!   │ H │ used │ H │  F1  │ H │  F2  │ H │        used        │ S │
//!   └───┴──────┴───┴──────┴───┴──────┴───┴────────────────────┴───┘
//!                    │
//!                    ▼  F1 absorbs F2, then is split:
//!   ┌───┬──────┬───┬────────────┬───┬──┬───┬────────────────────┬───┐
//!   │ H │ used │ H │ used (24)  │ H │F │ H │        used        │ S │
//!   └───┴──────┴───┴────────────┴───┴──┴───┴────────────────────┴───┘
//!                                 ▲
//!                                 └── cursor for the next search
//! ```
//!
//! - A free block first swallows any free blocks directly after it.
//! - If the leftover after carving the request could not hold a header plus
//!   8 bytes, the whole block is handed out; otherwise a fresh free header is
//!   written right after the request.
//! - A scan that comes back to where it started fails with
//!   [`AllocError::OutOfMemory`].
//!
//! Release validates the pointer against the chain, marks the block free and
//! merges it with free neighbors on both sides, so no two free blocks are
//! ever adjacent.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Fixed arena**: The region is never grown
//! - **Neighbor coalescing only**: No compaction
//! - **Release is O(n)**: The pointer is validated by walking the chain

pub mod align;
mod arena;
mod block;
pub mod error;
mod heap;

pub use arena::MIN_ARENA;
pub use block::{HEADER_SIZE, MIN_PAYLOAD};
pub use error::{AllocError, HeapError, ReleaseError};
pub use heap::{BlockInfo, Blocks, FreeListAllocator};
