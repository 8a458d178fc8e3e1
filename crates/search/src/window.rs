/// Initial window size and growth step
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// How many filtered records are materialized at once.
///
/// The window only ever holds a count; the visible records are always the
/// prefix of the current filtered sequence of that length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    step: usize,
    size: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Window {
    /// A zero page size is bumped to one so the window can always grow.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        let step = page_size.max(1);
        Self { step, size: step }
    }

    /// Visible count for a filtered sequence of `total` records
    #[must_use]
    pub fn shown(&self, total: usize) -> usize {
        self.size.min(total)
    }

    /// Back to the initial size, never the previous one
    pub fn reset(&mut self, total: usize) -> usize {
        self.size = self.step.min(total);
        self.size
    }

    /// Extend by one step, clamped to `total`; returns whether anything new
    /// became visible.
    pub fn grow(&mut self, total: usize) -> bool {
        let before = self.shown(total);
        self.size = self.size.saturating_add(self.step).min(total);
        self.size > before
    }

    #[must_use]
    pub fn has_more(&self, total: usize) -> bool {
        self.shown(total) < total
    }

    #[must_use]
    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.shown(items.len())]
    }
}
