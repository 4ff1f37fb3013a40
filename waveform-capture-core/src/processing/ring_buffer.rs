/// Fixed-capacity mono sample queue between the hardware tap and the
/// writer thread. Shared as `Arc<parking_lot::Mutex<RingBuffer>>`.
///
/// When the writer falls behind, the oldest samples are overwritten and
/// counted in `dropped`.
#[derive(Debug)]
pub struct RingBuffer {
    slots: Box<[f32]>,
    /// Index of the oldest buffered sample.
    head: usize,
    len: usize,
    dropped: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0.0; capacity.max(1)].into_boxed_slice(),
            head: 0,
            len: 0,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Samples overwritten before the writer thread drained them.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Downmix interleaved frames to mono (channel average) and append.
    /// A trailing partial frame is ignored.
    ///
    /// Does not allocate; safe on the hardware callback.
    pub fn push_frames(&mut self, samples: &[f32], channels: u16) {
        let channels = usize::from(channels.max(1));
        if channels == 1 {
            samples.iter().for_each(|&s| self.push(s));
            return;
        }
        let scale = 1.0 / channels as f32;
        for frame in samples.chunks_exact(channels) {
            self.push(frame.iter().sum::<f32>() * scale);
        }
    }

    fn push(&mut self, sample: f32) {
        let capacity = self.capacity();
        let tail = (self.head + self.len) % capacity;
        self.slots[tail] = sample;
        if self.len == capacity {
            self.head = (self.head + 1) % capacity;
            self.dropped += 1;
        } else {
            self.len += 1;
        }
    }

    /// Remove every buffered sample, oldest first.
    pub fn drain(&mut self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len);
        let end = self.head + self.len;
        if end <= self.capacity() {
            out.extend_from_slice(&self.slots[self.head..end]);
        } else {
            out.extend_from_slice(&self.slots[self.head..]);
            out.extend_from_slice(&self.slots[..end - self.capacity()]);
        }
        self.head = 0;
        self.len = 0;
        out
    }
}
