//! Still image capture
//!
//! A capture opens the camera, lets it settle, keeps exactly one frame and
//! releases the device before returning. The frame is downscaled to a fixed
//! resolution and written over the previous cycle's image.

mod capture;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::Result;

pub use capture::{CameraCapturer, resize_and_save};

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Resolution {
    /// Target resolution sent to the analysis service
    pub const DEFAULT: Self = Self::new(800, 600);

    /// Create a resolution
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An image captured for the current cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// Where the encoded image lives
    pub path: PathBuf,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl CapturedImage {
    /// Describe an existing image file without decoding it fully
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read as an image
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (width, height) = image::image_dimensions(&path)?;
        Ok(Self {
            path,
            width,
            height,
        })
    }

    /// Image dimensions
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Yields a still image on demand
#[async_trait]
pub trait Capturer: Send {
    /// Capture one frame
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if the camera cannot be opened and
    /// `Capture` if the frame cannot be read, decoded or saved
    async fn capture(&mut self) -> Result<CapturedImage>;
}
