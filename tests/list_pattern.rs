//! Drives the allocator the way a tail-appending list does: many equal
//! sized nodes, appended at the end and dropped from the end.

use std::{mem, ptr::NonNull, slice};

use nextfit::{AllocError, FreeListAllocator, HEADER_SIZE};
use rstest::rstest;

#[repr(C)]
struct Node {
  value: i32,
  next: Option<NonNull<Node>>,
}

fn words_as_bytes(words: &mut [u64]) -> &mut [u8] {
  let len = mem::size_of_val(words);
  unsafe { slice::from_raw_parts_mut(words.as_mut_ptr().cast::<u8>(), len) }
}

/// Replays `commands` and returns the values left in the list.
fn replay(
  heap: &mut FreeListAllocator<'_>,
  commands: &str,
) -> Result<Vec<i32>, AllocError> {
  let mut nodes: Vec<NonNull<Node>> = Vec::new();

  for (count, command) in commands.bytes().enumerate() {
    match command {
      b'a' => {
        let node = heap.allocate(mem::size_of::<Node>())?.cast::<Node>();
        unsafe {
          node.write(Node {
            value: count as i32,
            next: None,
          });
          if let Some(mut tail) = nodes.last().copied() {
            tail.as_mut().next = Some(node);
          }
        }
        nodes.push(node);
      }
      b'c' => {
        if let Some(tail) = nodes.pop() {
          if let Some(mut previous) = nodes.last().copied() {
            unsafe { previous.as_mut().next = None };
          }
          heap.try_release(tail.cast()).unwrap();
        }
      }
      b'b' => {}
      _ => break,
    }
    heap.check().unwrap();
  }

  let mut values = Vec::new();
  let mut current = nodes.first().copied();
  while let Some(node) = current {
    unsafe {
      values.push(node.as_ref().value);
      current = node.as_ref().next;
    }
  }

  for node in nodes.drain(..).rev() {
    heap.try_release(node.cast()).unwrap();
  }
  heap.check().unwrap();

  Ok(values)
}

#[rstest]
#[case("", &[])]
#[case("aaa.", &[0, 1, 2])]
#[case("aacab.", &[0, 3])]
#[case("cca", &[2])]
#[case("abab", &[0, 2])]
#[case("aaaccc", &[])]
#[case("aaxaa", &[0, 1])]
fn test_commands(
  #[case] commands: &str,
  #[case] expected: &[i32],
) {
  let mut words = vec![0u64; 512];
  let mut heap = FreeListAllocator::new(words_as_bytes(&mut words));

  assert_eq!(replay(&mut heap, commands).unwrap(), expected);
}

#[test]
fn test_append_until_exhausted() {
  let node = HEADER_SIZE + mem::size_of::<Node>();
  let mut words = vec![0u64; 64];
  let mut heap = FreeListAllocator::new(words_as_bytes(&mut words));
  let capacity = {
    heap.initialize().unwrap();
    heap.capacity().unwrap()
  };

  let fits = (capacity + HEADER_SIZE) / node;
  let commands = "a".repeat(fits + 1);

  assert!(matches!(
    replay(&mut heap, &commands),
    Err(AllocError::OutOfMemory { .. })
  ));
}

#[test]
fn test_churn_at_the_tail_stays_compact() {
  let mut words = vec![0u64; 64];
  let mut heap = FreeListAllocator::new(words_as_bytes(&mut words));

  let commands = "acacacacacacacacacacacacacacacacacacacacacacacacac".repeat(20);
  assert_eq!(replay(&mut heap, &commands).unwrap(), Vec::<i32>::new());

  let free: Vec<_> = heap.blocks().filter(|block| block.free).collect();
  assert_eq!(free.len(), 1);
  assert_eq!(Some(free[0].size), heap.capacity());
}
