/// Granule every header, payload and block size is a multiple of.
pub const ALIGNMENT: usize = 8;

/// Rounds `value` up to the next multiple of [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use nextfit::align;
///
/// assert_eq!(align!(0), 0);
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(16), 16);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Rounds `value` down to the previous multiple of [`ALIGNMENT`].
///
/// ```rust
/// use nextfit::align_down;
///
/// assert_eq!(align_down!(13), 8);
/// assert_eq!(align_down!(7), 0);
/// ```
#[macro_export]
macro_rules! align_down {
  ($value:expr) => {
    $value & !($crate::align::ALIGNMENT - 1)
  };
}
