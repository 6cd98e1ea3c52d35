/// Channel-fed frame source
///
/// Lets a capture thread push frames while the engine polls them. An empty
/// channel reads as `Pending`; once every sender is dropped the source
/// reports `Ended`.
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};

use super::{FramePoll, FrameSource};
use crate::error::SourceError;
use crate::frame::Frame;

pub struct ChannelSource {
    receiver: Receiver<Frame>,
    name: Option<String>,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<Frame>) -> Self {
        Self {
            receiver,
            name: None,
        }
    }

    /// Create a connected sender and source
    ///
    /// `capacity` of `None` gives an unbounded channel.
    pub fn pair(capacity: Option<usize>) -> (Sender<Frame>, Self) {
        let (tx, rx) = match capacity {
            Some(cap) => bounded(cap),
            None => unbounded(),
        };
        (tx, Self::new(rx))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl FrameSource for ChannelSource {
    fn next_frame(&mut self) -> Result<FramePoll, SourceError> {
        match self.receiver.try_recv() {
            Ok(frame) => Ok(FramePoll::Ready(frame)),
            Err(TryRecvError::Empty) => Ok(FramePoll::Pending),
            Err(TryRecvError::Disconnected) => Ok(FramePoll::Ended),
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
    fn test_channel_source_states() {
        let (tx, mut source) = ChannelSource::pair(None);

        assert!(matches!(source.next_frame().unwrap(), FramePoll::Pending));

        tx.send(Frame::solid(2, 2, [1, 1, 1], 5)).unwrap();
        match source.next_frame().unwrap() {
            FramePoll::Ready(frame) => assert_eq!(frame.sequence, 5),
            other => panic!("Expected frame, got {:?}", other),
        }

        drop(tx);
        assert!(source.next_frame().unwrap().is_ended());
    }

    #[test]
    fn test_buffered_frames_survive_disconnect() {
        let (tx, mut source) = ChannelSource::pair(Some(4));
        tx.send(Frame::solid(1, 1, [0, 0, 0], 0)).unwrap();
        drop(tx);

        assert!(source.next_frame().unwrap().is_ready());
        assert!(source.next_frame().unwrap().is_ended());
    }
}
