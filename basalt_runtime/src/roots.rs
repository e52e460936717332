//! Root enumeration for garbage collection.

use basalt_core::Value;

/// Provider of GC roots.
///
/// The execution context implements this by enumerating the live region of
/// its operand stack; the collector calls the visitor for every value that
/// could be a heap reference.
pub trait RootProvider {
    /// Visit every live root value.
    fn visit_roots<F>(&self, visitor: F)
    where
        F: FnMut(Value);
}

impl RootProvider for [Value] {
    fn visit_roots<F>(&self, mut visitor: F)
    where
        F: FnMut(Value),
    {
        for &value in self {
            visitor(value);
        }
    }
}

impl RootProvider for Vec<Value> {
    fn visit_roots<F>(&self, visitor: F)
    where
        F: FnMut(Value),
    {
        self.as_slice().visit_roots(visitor);
    }
}

/// A provider with no roots; collection frees everything.
pub struct NoRoots;

impl RootProvider for NoRoots {
    fn visit_roots<F>(&self, _visitor: F)
    where
        F: FnMut(Value),
    {
    }
}
