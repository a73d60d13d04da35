//! Leased buffer pooling for zero-allocation send and receive paths.
//!
//! Payloads crossing the relay boundary are copied into buffers leased from
//! a `SlicePool`. A lease is represented by the owned `PooledSlice` value:
//! acquiring moves it out of the pool, releasing moves it back in, so a
//! double release or a use after release fails to compile instead of
//! corrupting the pool.

/// A leased byte buffer with a fixed logical length.
///
/// Holds exclusive ownership of its storage for the duration of the lease;
/// two outstanding leases never alias.
pub struct PooledSlice {
    buf: Vec<u8>,
}

impl PooledSlice {
    /// Returns the slice contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the slice contents for writing.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Returns the logical length of the slice.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if the slice is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl AsRef<[u8]> for PooledSlice {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::fmt::Debug for PooledSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledSlice").field("len", &self.len()).finish()
    }
}

/// A pool of reusable byte buffers handed out as leases.
pub struct SlicePool {
    /// Buffers waiting to be leased again
    pool: Vec<Vec<u8>>,
    /// Capacity to reserve when a fresh buffer must be allocated
    buffer_size: usize,
    /// Maximum buffers retained for reuse
    max_pool_size: usize,
}

impl SlicePool {
    /// Creates a new slice pool.
    pub fn new(buffer_size: usize, max_pool_size: usize) -> Self {
        Self { pool: Vec::with_capacity(max_pool_size), buffer_size, max_pool_size }
    }

    /// Leases a buffer of the given logical length, reusing storage when any
    /// is available. The returned slice is zero-filled.
    pub fn acquire(&mut self, len: usize) -> PooledSlice {
        let mut buf = self
            .pool
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.buffer_size.max(len)));
        buf.resize(len, 0);
        PooledSlice { buf }
    }

    /// Ends a lease, returning the storage for reuse.
    pub fn release(&mut self, slice: PooledSlice) {
        let mut buf = slice.buf;
        if self.pool.len() < self.max_pool_size {
            buf.clear();
            self.pool.push(buf);
        }
    }

    /// Returns the number of buffers currently available for lease.
    pub fn available(&self) -> usize {
        self.pool.len()
    }

    /// Drops all retained buffers.
    pub fn clear(&mut self) {
        self.pool.clear();
    }
}

impl Default for SlicePool {
    fn default() -> Self {
        Self::new(crate::constants::RECEIVE_BUFFER_SIZE, 64)
    }
}
