//! Type aliases shared across crates.

/// A progress callback receiving (completed, total) counts.
///
/// Borrowed for the duration of one long-running call, so it may capture
/// local state such as a terminal progress bar.
pub type ProgressFn<'a> = &'a mut dyn FnMut(usize, usize);
