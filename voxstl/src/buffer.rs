use crate::triangle::Triangle;

/// Append-only triangle store, used both as per-job staging and as the
/// final mesh aggregate.
///
/// Capacity only ever grows, always by doubling rather than exact fit,
/// so repeated small appends stay amortised O(1) even at tens of
/// millions of triangles. A buffer has exactly one owner; workers build
/// their own and hand it to the main thread wholesale via [`concat`].
///
/// [`concat`]: TriangleBuffer::concat
#[derive(Debug, Default)]
pub struct TriangleBuffer {
    tris: Vec<Triangle>,
}

impl TriangleBuffer {
    pub fn new() -> Self {
        TriangleBuffer { tris: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TriangleBuffer {
            tris: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.tris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tris.capacity()
    }

    /// Size of the stored triangles in bytes.
    pub fn bytes(&self) -> usize {
        self.tris.len() * std::mem::size_of::<Triangle>()
    }

    /// Grow the capacity to at least `n` slots by doubling the current
    /// capacity until it fits.
    pub fn ensure(&mut self, n: usize) {
        if self.tris.capacity() >= n {
            return;
        }

        let mut capacity = self.tris.capacity().max(1);
        while capacity < n {
            capacity *= 2;
        }
        self.tris.reserve_exact(capacity - self.tris.len());
    }

    /// Append one triangle. Callers [`ensure`] room first, extractors
    /// do so once per emitted pair.
    ///
    /// [`ensure`]: TriangleBuffer::ensure
    pub fn push(&mut self, tri: Triangle) {
        debug_assert!(self.tris.len() < self.tris.capacity(), "push without ensure");
        self.tris.push(tri);
    }

    /// Append all of `src` after the existing triangles, preserving its
    /// insertion order. Grows to twice the combined count when the
    /// current capacity is short.
    pub fn concat(&mut self, src: TriangleBuffer) {
        let total = self.tris.len() + src.tris.len();
        if self.tris.capacity() < total {
            self.tris.reserve_exact(2 * total - self.tris.len());
        }
        self.tris.extend(src.tris);
    }

    /// Iterate the valid (non-deleted) triangles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Triangle> {
        self.tris.iter().filter(|t| t.is_valid())
    }
}
