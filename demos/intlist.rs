//! Builds a singly linked list of integers inside a fixed arena.
//!
//! Reads single-byte commands from stdin:
//!
//! - `a` appends a node holding the command counter to the tail
//! - `b` does nothing
//! - `c` drops the tail node
//! - anything else stops and prints the list
//!
//! ```text
//! $ printf 'aacab.' | cargo run --example intlist
//! 0,3;
//! ```
//!
//! Set `RUST_LOG=nextfit=trace` to watch every split, merge and release.

use std::{
  io::{self, Read, Write},
  mem,
  ptr::NonNull,
  slice,
};

use anyhow::{Context, bail};
use clap::Parser;
use nextfit::FreeListAllocator;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Grow and shrink an integer list inside a fixed arena")]
struct Args {
  /// Size of the arena in bytes.
  #[arg(long, default_value_t = 4096)]
  arena_size: usize,

  /// Print every block of the arena to stderr before exiting.
  #[arg(long)]
  dump: bool,
}

#[repr(C)]
struct Node {
  value: i32,
  next: Option<NonNull<Node>>,
}

/// List whose nodes all live in the arena.
struct IntList {
  head: Option<NonNull<Node>>,
}

impl IntList {
  fn new() -> Self {
    Self { head: None }
  }

  /// Appends `value` to the tail.
  fn push(
    &mut self,
    heap: &mut FreeListAllocator<'_>,
    value: i32,
  ) -> anyhow::Result<()> {
    let node = heap
      .allocate(mem::size_of::<Node>())
      .with_context(|| format!("appending {value}"))?
      .cast::<Node>();

    unsafe {
      node.write(Node { value, next: None });

      match self.tail() {
        Some(mut tail) => tail.as_mut().next = Some(node),
        None => self.head = Some(node),
      }
    }

    Ok(())
  }

  /// Drops the tail node; an empty list is left alone.
  fn pop(
    &mut self,
    heap: &mut FreeListAllocator<'_>,
  ) {
    let Some(head) = self.head else {
      return;
    };

    unsafe {
      let mut previous: Option<NonNull<Node>> = None;
      let mut current = head;
      while let Some(next) = current.as_ref().next {
        previous = Some(current);
        current = next;
      }

      match previous {
        Some(mut previous) => previous.as_mut().next = None,
        None => self.head = None,
      }

      heap.release(current.cast());
    }
  }

  fn tail(&self) -> Option<NonNull<Node>> {
    let mut current = self.head?;
    unsafe {
      while let Some(next) = current.as_ref().next {
        current = next;
      }
    }
    Some(current)
  }

  fn values(&self) -> Vec<i32> {
    let mut values = Vec::new();
    let mut current = self.head;
    while let Some(node) = current {
      unsafe {
        values.push(node.as_ref().value);
        current = node.as_ref().next;
      }
    }
    values
  }

  /// Releases every node.
  fn clear(
    &mut self,
    heap: &mut FreeListAllocator<'_>,
  ) {
    let mut current = self.head.take();
    while let Some(node) = current {
      unsafe {
        current = node.as_ref().next;
      }
      heap.release(node.cast());
    }
  }
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();

  let mut words = vec![0u64; args.arena_size.div_ceil(mem::size_of::<u64>())];
  let region = unsafe { slice::from_raw_parts_mut(words.as_mut_ptr().cast::<u8>(), args.arena_size) };

  let mut heap = FreeListAllocator::new(region);
  heap
    .initialize()
    .with_context(|| format!("arena of {} bytes", args.arena_size))?;

  let mut list = IntList::new();
  let mut count: i32 = 0;

  for byte in io::stdin().lock().bytes() {
    match byte? {
      b'a' => list.push(&mut heap, count)?,
      b'b' => {}
      b'c' => list.pop(&mut heap),
      _ => break,
    }
    count += 1;
  }

  let values: Vec<String> = list.values().iter().map(i32::to_string).collect();
  let mut stdout = io::stdout().lock();
  writeln!(stdout, "{};", values.join(","))?;

  if args.dump {
    for block in heap.blocks() {
      eprintln!(
        "{:#x} {:>6} {}",
        block.payload.as_ptr().addr(),
        block.size,
        if block.free { "free" } else { "used" }
      );
    }
  }

  list.clear(&mut heap);

  if let Err(err) = heap.check() {
    bail!("heap corrupted: {err}");
  }
  info!(commands = count, "done");

  Ok(())
}
