use tracing::{debug, info, warn};

use crate::tomo_pipeline::common::error::Result;
use crate::tomo_pipeline::frames::source::{AcquiredSource, FrameSource};
use crate::tomo_pipeline::frames::transformer::FrameTransformer;
use crate::tomo_pipeline::frames::types::{FirstFrameSnapshot, ProjectionStack, StackBuild};

const PROGRESS_EVERY: usize = 100;

/// Reads frames in stream order and turns them into a projection stack.
pub struct ProjectionStackBuilder {
    transformer: FrameTransformer,
}

impl ProjectionStackBuilder {
    pub fn new(transformer: FrameTransformer) -> Self {
        Self { transformer }
    }

    pub fn transformer(&self) -> &FrameTransformer {
        &self.transformer
    }

    /// Reads up to `count` frames from an opened source.
    ///
    /// A source that ends early is not an error here: the stack is simply shorter
    /// than `count` and [`StackBuild::exhausted_early`] reports it.
    pub fn build<S: FrameSource + ?Sized>(
        &self,
        source: &mut AcquiredSource<'_, S>,
        count: usize,
    ) -> Result<StackBuild> {
        let size = self.transformer.target_size() as usize;
        let mut projections = Vec::with_capacity(count);
        let mut snapshot = None;

        for index in 0..count {
            let Some(frame) = source.read_frame()? else {
                warn!(
                    "Frame source ended after {} of {} frames",
                    projections.len(),
                    count
                );
                break;
            };

            let projection = self.transformer.transform(&frame)?;
            if index == 0 {
                snapshot = Some(FirstFrameSnapshot {
                    raw: frame,
                    projection: projection.clone(),
                });
            }
            projections.push(projection);

            if (index + 1) % PROGRESS_EVERY == 0 {
                debug!("Transformed {}/{} frames", index + 1, count);
            }
        }

        let stack = ProjectionStack::from_projections(&projections, (size, size))?;
        info!(
            projections = stack.len(),
            size,
            "Projection stack assembled"
        );

        Ok(StackBuild {
            stack,
            snapshot,
            requested: count,
        })
    }

    /// Acquires `source`, builds the stack and releases the source again.
    pub fn build_from<S: FrameSource + ?Sized>(&self, source: &mut S, count: usize) -> Result<StackBuild> {
        let mut acquired = AcquiredSource::acquire(source)?;
        self.build(&mut acquired, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tomo_pipeline::common::error::PipelineError;
    use crate::tomo_pipeline::frames::memory_source::MemoryFrameSource;
    use crate::tomo_pipeline::frames::transformer::attenuation;
    use crate::tomo_pipeline::frames::types::RawFrame;

    /// Source whose frame `i` has gray level `i`, optionally failing at one index.
    struct CountingSource {
        total: usize,
        fail_at: Option<usize>,
        next: usize,
        opens: usize,
        releases: usize,
    }

    impl CountingSource {
        fn new(total: usize) -> Self {
            Self { total, fail_at: None, next: 0, opens: 0, releases: 0 }
        }
    }

    impl FrameSource for CountingSource {
        fn open(&mut self) -> Result<()> {
            self.opens += 1;
            Ok(())
        }

        fn read_frame(&mut self) -> Result<Option<RawFrame>> {
            if Some(self.next) == self.fail_at {
                return Err(PipelineError::FrameRead("Mock decode error".to_string()));
            }
            if self.next >= self.total {
                return Ok(None);
            }
            let level = self.next as u8;
            self.next += 1;
            Ok(Some(RawFrame::from_pixel(4, 4, image::Rgb([level, level, level]))))
        }

        fn release(&mut self) {
            self.releases += 1;
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn builder(size: u32) -> ProjectionStackBuilder {
        ProjectionStackBuilder::new(FrameTransformer::new(size))
    }

    #[test]
    fn test_reads_exactly_count_frames_in_order() {
        let mut source = CountingSource::new(10);
        let build = builder(4).build_from(&mut source, 6).unwrap();

        assert_eq!(build.stack.len(), 6);
        assert!(!build.exhausted_early());
        for (i, projection) in build.stack.projections().enumerate() {
            assert_eq!(projection[[0, 0]], attenuation(i as u8));
        }
        // the remaining frames were never touched
        assert_eq!(source.next, 6);
    }

    #[test]
    fn test_short_source_yields_short_stack() {
        let mut source = CountingSource::new(3);
        let build = builder(4).build_from(&mut source, 8).unwrap();

        assert_eq!(build.stack.len(), 3);
        assert_eq!(build.requested, 8);
        assert!(build.exhausted_early());
    }

    #[test]
    fn test_snapshot_holds_first_frame() {
        let mut source = CountingSource::new(5);
        let build = builder(4).build_from(&mut source, 5).unwrap();

        let snapshot = build.snapshot.expect("first frame snapshot");
        assert_eq!(snapshot.raw.get_pixel(0, 0)[0], 0);
        assert_eq!(snapshot.projection, build.stack.projection(0).to_owned());
    }

    #[test]
    fn test_empty_source() {
        let mut source = MemoryFrameSource::new(Vec::new());
        let build = builder(4).build_from(&mut source, 3).unwrap();

        assert!(build.stack.is_empty());
        assert!(build.snapshot.is_none());
        assert_eq!(build.stack.projection_shape(), (4, 4));
    }

    #[test]
    fn test_source_released_after_success() {
        let mut source = CountingSource::new(2);
        builder(4).build_from(&mut source, 5).unwrap();

        assert_eq!(source.opens, 1);
        assert_eq!(source.releases, 1);
    }

    #[test]
    fn test_source_released_after_read_error() {
        let mut source = CountingSource::new(10);
        source.fail_at = Some(2);

        let result = builder(4).build_from(&mut source, 5);

        assert!(matches!(result, Err(PipelineError::FrameRead(_))));
        assert_eq!(source.releases, 1);
    }
}
