use std::collections::VecDeque;

/// Outbound messages waiting for a ready socket
///
/// FIFO. The supervisor drains it exactly once each time a socket
/// transport becomes ready; entries are never reordered or merged.
#[derive(Debug, Default, Clone)]
pub struct SendBuffer {
    pending: VecDeque<String>,
}

impl SendBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, message: impl Into<String>) {
        self.pending.push_back(message.into());
    }

    /// Put messages back ahead of everything already pending, keeping their order
    pub fn requeue_front(&mut self, messages: Vec<String>) {
        for message in messages.into_iter().rev() {
            self.pending.push_front(message);
        }
    }

    /// Take every pending message in enqueue order, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<String> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
