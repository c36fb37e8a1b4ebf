use crate::tomo_pipeline::common::error::Result;
use crate::tomo_pipeline::frames::types::RawFrame;

/// Forward-only supplier of decoded frames, like a video decode handle.
///
/// Frames can only be read between `open` and `release`. Use [`AcquiredSource`]
/// rather than calling the lifecycle methods by hand.
pub trait FrameSource {
    fn open(&mut self) -> Result<()>;

    /// Next frame in stream order, `None` once the stream has ended.
    fn read_frame(&mut self) -> Result<Option<RawFrame>>;

    /// Frees the underlying handle. Must be safe to call more than once.
    fn release(&mut self);

    /// Human readable origin, recorded in the run report.
    fn describe(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// An opened frame source. Dropping it releases the source, so every exit path
/// (stream end, error, unwinding) gives the handle back.
pub struct AcquiredSource<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: FrameSource + ?Sized> AcquiredSource<'a, S> {
    pub fn acquire(source: &'a mut S) -> Result<Self> {
        if let Err(e) = source.open() {
            source.release();
            return Err(e);
        }
        Ok(Self { source })
    }

    pub fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        self.source.read_frame()
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }
}

impl<S: FrameSource + ?Sized> Drop for AcquiredSource<'_, S> {
    fn drop(&mut self) {
        self.source.release();
    }
}
