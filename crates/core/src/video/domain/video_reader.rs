use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Source of RGB frames for the sitting pipeline.
///
/// A still image is a one-frame source with `fps == 0`.
pub trait VideoReader: Send {
    /// Opens `path` and reports its dimensions and frame rate.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Frames in decode order. Calling before `open` yields a single error.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases decoder state. Safe to call more than once.
    fn close(&mut self);
}
