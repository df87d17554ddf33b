use std::ops::{Deref, DerefMut};

use crate::SwapError;

/// Mutable bookkeeping for a single traversal.
///
/// A context belongs to exactly one call of [`crate::Replacer::transform`] and
/// is discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalContext {
    count: u64,
    limit: u64,
    depth: usize,
    max_depth: usize,
}

impl TraversalContext {
    pub fn new(limit: u64, max_depth: usize) -> Self {
        Self {
            count: 0,
            limit,
            depth: 0,
            max_depth,
        }
    }

    /// Replacements made so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Current container nesting level. The root value sits at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn budget_exhausted(&self) -> bool {
        self.count >= self.limit
    }

    /// Consumes one unit of budget. Returns false once the budget is spent.
    pub fn try_consume(&mut self) -> bool {
        if self.budget_exhausted() {
            return false;
        }
        self.count += 1;
        true
    }

    /// Descends one container level.
    ///
    /// The returned guard restores the previous depth when dropped, so early
    /// returns through `?` leave the context balanced.
    pub fn enter(&mut self) -> Result<DepthGuard<'_>, SwapError> {
        if self.depth >= self.max_depth {
            return Err(SwapError::DepthLimitExceeded {
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(DepthGuard { ctx: self })
    }
}

/// Scoped hold on one level of nesting, released on drop.
#[derive(Debug)]
pub struct DepthGuard<'a> {
    ctx: &'a mut TraversalContext,
}

impl Deref for DepthGuard<'_> {
    type Target = TraversalContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for DepthGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.ctx.depth -= 1;
    }
}
