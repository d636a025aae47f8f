use std::iter::FusedIterator;
use std::marker::PhantomData;

/// Iterator over exclusive references to each element of an
/// [`UnmanagedSpan`][crate::UnmanagedSpan], in memory order.
///
/// Created by [`UnmanagedSpan::elements()`][crate::UnmanagedSpan::elements].
#[derive(Debug)]
pub struct Elements<'a, T> {
    current: *mut T,
    remaining: usize,

    _span: PhantomData<&'a mut [T]>,
}

impl<T> Elements<'_, T> {
    /// # Safety
    ///
    /// The caller must guarantee that `ptr` is valid for reads and writes of `len` elements for
    /// the lifetime `'a` and that nothing else accesses the region during that lifetime.
    pub(crate) unsafe fn new(ptr: *mut T, len: usize) -> Self {
        Self {
            current: ptr,
            remaining: len,
            _span: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Elements<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.remaining = self.remaining.checked_sub(1)?;

        let element = self.current;

        // SAFETY: We only get here if at least one element remained before this call, so the
        // pointer after it is at most one past the end of the region.
        self.current = unsafe { self.current.add(1) };

        // SAFETY: The element is inside the region (see above) and each element is handed out
        // exactly once, so the exclusive references never alias.
        Some(unsafe { &mut *element })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Elements<'_, T> {}
impl<T> FusedIterator for Elements<'_, T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn visits_every_element_once() {
        let mut storage = [1_i32, 2, 3, 4];

        // SAFETY: The array outlives the iterator and is not accessed while it exists.
        let elements = unsafe { Elements::new(storage.as_mut_ptr(), storage.len()) };
        assert_eq!(elements.len(), 4);

        for element in elements {
            *element *= 10;
        }

        assert_eq!(storage, [10, 20, 30, 40]);
    }

    #[test]
    fn empty_region_yields_nothing() {
        let mut storage: [u8; 0] = [];

        // SAFETY: Zero elements are never dereferenced.
        let mut elements = unsafe { Elements::new(storage.as_mut_ptr(), 0) };

        assert!(elements.next().is_none());
        assert!(elements.next().is_none());
    }
}
