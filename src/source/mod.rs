/// Frame source module
///
/// A frame source hands the engine one frame per call, in capture order.
///
/// ## Poll states
///
/// ```text
/// next_frame()
///   ├── Ready(frame)  frame available
///   ├── Pending       nothing yet, engine backs off and retries
///   └── Ended         stream is over, engine stops cleanly
/// ```

pub mod channel;
pub mod image_sequence;
pub mod scripted;

use crate::error::SourceError;
use crate::frame::Frame;

/// Result of polling a frame source
#[derive(Debug, Clone)]
pub enum FramePoll {
    Ready(Frame),
    Pending,
    Ended,
}

impl FramePoll {
    pub fn is_ready(&self) -> bool {
        matches!(self, FramePoll::Ready(_))
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, FramePoll::Ended)
    }
}

/// Supplier of frames for the engine
pub trait FrameSource: Send {
    /// Poll for the next frame
    fn next_frame(&mut self) -> Result<FramePoll, SourceError>;

    /// Identity of the stream, copied into `engine.source_file`
    fn source_name(&self) -> Option<String> {
        None
    }

    /// Unix time of playback position zero, if known
    fn epoch_time(&self) -> Option<f64> {
        None
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<FramePoll, SourceError> {
        (**self).next_frame()
    }

    fn source_name(&self) -> Option<String> {
        (**self).source_name()
    }

    fn epoch_time(&self) -> Option<f64> {
        (**self).epoch_time()
    }
}

// Re-export commonly used types
pub use channel::ChannelSource;
pub use image_sequence::ImageSequenceSource;
pub use scripted::ScriptedSource;
