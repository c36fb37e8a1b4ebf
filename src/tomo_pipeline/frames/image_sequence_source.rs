//! Frame source reading a directory of decoded video frames.
//!
//! Frames are expected to be exported one image per file (for example with
//! `ffmpeg -i scan.mp4 frames/%05d.png`). Files are read in lexical file name
//! order, so zero-padded numbering keeps the stream order.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::frames::source::FrameSource;
use crate::tomo_pipeline::frames::types::RawFrame;

const FRAME_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

pub struct ImageSequenceSource {
    directory: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    opened: bool,
}

impl ImageSequenceSource {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            files: Vec::new(),
            cursor: 0,
            opened: false,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of frame files found by `open`.
    pub fn frame_count(&self) -> usize {
        self.files.len()
    }

    fn is_frame_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.directory).map_err(|e| {
            PipelineError::SourceOpen(format!("{}: {}", self.directory.display(), e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| PipelineError::SourceOpen(format!("{}: {}", self.directory.display(), e)))?
                .path();
            if path.is_file() && Self::is_frame_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(PipelineError::SourceOpen(format!(
                "{}: no frame images found",
                self.directory.display()
            )));
        }

        debug!("Opened {} with {} frames", self.directory.display(), files.len());
        self.files = files;
        self.cursor = 0;
        self.opened = true;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        if !self.opened {
            return Err(PipelineError::FrameRead(format!(
                "{} is not open",
                self.directory.display()
            )));
        }

        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        let frame = image::open(path)
            .map_err(|e| PipelineError::FrameRead(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.files.clear();
        self.cursor = 0;
        self.opened = false;
    }

    fn describe(&self) -> String {
        self.directory.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tomo_pipeline::frames::source::AcquiredSource;

    fn write_frame(dir: &Path, name: &str, value: u8) {
        RawFrame::from_pixel(6, 4, image::Rgb([value, value, value]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_frames_are_read_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "00002.png", 20);
        write_frame(dir.path(), "00000.png", 0);
        write_frame(dir.path(), "00001.png", 10);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::new(dir.path());
        let mut acquired = AcquiredSource::acquire(&mut source).unwrap();

        let mut levels = Vec::new();
        while let Some(frame) = acquired.read_frame().unwrap() {
            assert_eq!(frame.dimensions(), (6, 4));
            levels.push(frame.get_pixel(0, 0)[0]);
        }
        assert_eq!(levels, vec![0, 10, 20]);
    }

    #[test]
    fn test_missing_directory_fails_to_open() {
        let mut source = ImageSequenceSource::new("/definitely/not/a/frame/dir");
        let result = AcquiredSource::acquire(&mut source);
        assert!(matches!(result, Err(PipelineError::SourceOpen(_))));
    }

    #[test]
    fn test_directory_without_frames_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "empty").unwrap();

        let mut source = ImageSequenceSource::new(dir.path());
        assert!(matches!(source.open(), Err(PipelineError::SourceOpen(_))));
    }

    #[test]
    fn test_corrupt_frame_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("00000.png"), b"definitely not png").unwrap();

        let mut source = ImageSequenceSource::new(dir.path());
        let mut acquired = AcquiredSource::acquire(&mut source).unwrap();
        assert!(matches!(acquired.read_frame(), Err(PipelineError::FrameRead(_))));
    }

    #[test]
    fn test_release_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "00000.png", 1);

        let mut source = ImageSequenceSource::new(dir.path());
        {
            let _acquired = AcquiredSource::acquire(&mut source).unwrap();
        }
        assert_eq!(source.frame_count(), 0);
        assert!(matches!(source.read_frame(), Err(PipelineError::FrameRead(_))));
    }
}
