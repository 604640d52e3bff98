//! Disposal hooks run in LIFO order.

use std::rc::Rc;

use crate::traits::Dispose;

#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<Box<dyn FnOnce()>>,
}

impl DisposeBag {
    pub(crate) fn push_disposer(&mut self, target: Rc<dyn Dispose>) {
        self.hooks.push(Box::new(move || target.dispose()));
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Runs and drops every hook, newest first.
    pub(crate) fn run_all_reverse(mut self) {
        while let Some(hook) = self.hooks.pop() {
            hook();
        }
    }
}
