use std::collections::VecDeque;

use parking_lot::Mutex;

use playsync_types::StreamTs;

/**
    Decoded units waiting for presentation, identified by stream timestamp.
*/
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: Mutex<VecDeque<StreamTs>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, ts: StreamTs) {
        self.frames.lock().push_back(ts);
    }

    pub fn pop(&self) -> Option<StreamTs> {
        self.frames.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let queue = FrameQueue::new();
        queue.push(StreamTs(1));
        queue.push(StreamTs(2));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(StreamTs(1)));
        assert_eq!(queue.pop(), Some(StreamTs(2)));
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }
}
