/// Scripted frame source
///
/// Replays a fixed queue of poll results. Once the queue is drained the
/// source reports `Ended`.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{FramePoll, FrameSource};
use crate::error::SourceError;
use crate::frame::Frame;

pub struct ScriptedSource {
    script: VecDeque<FramePoll>,
    consumed: Arc<AtomicU64>,
    name: Option<String>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            consumed: Arc::new(AtomicU64::new(0)),
            name: None,
        }
    }

    /// `count` solid frames numbered from zero
    pub fn numbered(count: u64) -> Self {
        let mut source = Self::new();
        for i in 0..count {
            source.push_frame(Frame::solid(4, 4, [0, 0, 0], i));
        }
        source
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn push(&mut self, poll: FramePoll) -> &mut Self {
        self.script.push_back(poll);
        self
    }

    pub fn push_frame(&mut self, frame: Frame) -> &mut Self {
        self.push(FramePoll::Ready(frame))
    }

    pub fn push_pending(&mut self) -> &mut Self {
        self.push(FramePoll::Pending)
    }

    /// Polls still queued
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Shared counter of polls served, usable after the source moved into
    /// an engine
    pub fn consumed_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.consumed)
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<FramePoll, SourceError> {
        match self.script.pop_front() {
            Some(poll) => {
                self.consumed.fetch_add(1, Ordering::Relaxed);
                Ok(poll)
            }
            None => Ok(FramePoll::Ended),
        }
    }

    fn source_name(&self) -> Option<String> {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_source_order() {
        let mut source = ScriptedSource::numbered(3);
        let counter = source.consumed_counter();

        for expected in 0..3 {
            match source.next_frame().unwrap() {
                FramePoll::Ready(frame) => assert_eq!(frame.sequence, expected),
                other => panic!("Expected frame, got {:?}", other),
            }
        }

        assert!(source.next_frame().unwrap().is_ended());
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_scripted_pending() {
        let mut source = ScriptedSource::new();
        source.push_pending().push_frame(Frame::solid(1, 1, [0, 0, 0], 9));

        assert!(matches!(source.next_frame().unwrap(), FramePoll::Pending));
        assert!(source.next_frame().unwrap().is_ready());
        assert_eq!(source.remaining(), 0);
    }
}
