//! Circular dependency and depth detection.
//!
//! The stack lives on the owning context, so two contexts never see each
//! other's frames.

use std::cell::RefCell;

use crate::{Key, ResolveError, ResolveResult};

#[derive(Default)]
pub(crate) struct ResolutionStack {
    frames: RefCell<Vec<Key>>,
}

impl ResolutionStack {
    /// Pushes `key`, failing when it is already being resolved or when the
    /// stack already holds `max_depth` frames.
    pub(crate) fn enter(&self, key: Key, max_depth: usize) -> ResolveResult<StackGuard<'_>> {
        let mut frames = self.frames.borrow_mut();
        if frames.contains(&key) {
            let path = frames
                .iter()
                .chain(std::iter::once(&key))
                .map(Key::display_name)
                .collect();
            return Err(ResolveError::Circular(path));
        }
        if frames.len() >= max_depth {
            return Err(ResolveError::DepthExceeded(max_depth));
        }
        frames.push(key);
        Ok(StackGuard { stack: self, key })
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }
}

/// Pops its frame on drop, including on early `?` returns.
pub(crate) struct StackGuard<'s> {
    stack: &'s ResolutionStack,
    key: Key,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        let last = self.stack.frames.borrow_mut().pop();
        debug_assert_eq!(last, Some(self.key));
    }
}
