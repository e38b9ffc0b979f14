/// Fixed-capacity circular sample store.
///
/// Indices are reduced modulo the capacity, so callers may hand in any cursor
/// value. Storage is allocated once by [`RingBuffer::new`] and never grows;
/// cursors live with the owner, which lets one buffer serve several readers and
/// writers at different positions.
#[derive(Debug, Clone)]
pub struct RingBuffer<T: Clone + Copy> {
    buffer: Vec<T>,
}

impl<T: Clone + Copy + Default> RingBuffer<T> {
    pub fn new(capacity: usize) -> RingBuffer<T> {
        Self::filled(capacity, T::default())
    }

    /// Reads the sample at `index` and leaves a zero behind.
    #[inline]
    pub fn take(&mut self, index: usize) -> T {
        let i = self.wrap(index);
        std::mem::take(&mut self.buffer[i])
    }

    pub fn clear(&mut self) {
        self.buffer.fill(T::default());
    }
}

impl<T: Clone + Copy> RingBuffer<T> {
    /// A ring of `capacity` slots, each holding `value`.
    pub fn filled(capacity: usize, value: T) -> RingBuffer<T> {
        RingBuffer {
            buffer: vec![value; capacity.max(1)],
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn wrap(&self, index: usize) -> usize {
        index % self.buffer.len()
    }

    #[inline]
    pub fn read(&self, index: usize) -> T {
        self.buffer[self.wrap(index)]
    }

    #[inline]
    pub fn write(&mut self, index: usize, value: T) {
        let i = self.wrap(index);
        self.buffer[i] = value;
    }
}

impl<T> RingBuffer<T>
where
    T: std::ops::AddAssign + Clone + Copy,
{
    #[inline]
    pub fn add(&mut self, index: usize, value: T) {
        let i = self.wrap(index);
        self.buffer[i] += value;
    }
}
