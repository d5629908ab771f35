//! One-shot frame grab through ffmpeg

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::ImageFormat;

use super::{CapturedImage, Capturer, Resolution};
use crate::config::CameraConfig;
use crate::{Error, Result};

/// Captures from a camera by running ffmpeg once per frame
///
/// The ffmpeg process owns the device for the duration of a single capture and
/// is killed if the capture future is dropped, so the camera is never held
/// between cycles.
pub struct CameraCapturer {
    config: CameraConfig,
}

impl CameraCapturer {
    /// Create a capturer
    #[must_use]
    pub const fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Arguments that grab a single settled frame as PNG on stdout
    #[must_use]
    pub fn ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-f".to_string(),
            self.config.input_format.clone(),
            "-i".to_string(),
            self.config.device.clone(),
            "-ss".to_string(),
            format!("{:.3}", self.config.settle.as_secs_f64()),
            "-frames:v".to_string(),
            "1".to_string(),
            "-f".to_string(),
            "image2pipe".to_string(),
            "-vcodec".to_string(),
            "png".to_string(),
            "-".to_string(),
        ]
    }

    fn ffmpeg_bin(&self) -> Result<PathBuf> {
        if let Some(bin) = &self.config.ffmpeg_bin {
            return Ok(bin.clone());
        }

        which::which("ffmpeg")
            .map_err(|_| Error::DeviceUnavailable("ffmpeg not found on PATH".to_string()))
    }

    /// Open the camera, read one frame and release it
    async fn grab_frame(&self) -> Result<Vec<u8>> {
        let bin = self.ffmpeg_bin()?;

        tracing::info!(device = %self.config.device, "initializing camera");
        let output = tokio::process::Command::new(&bin)
            .args(self.ffmpeg_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::DeviceUnavailable(format!("failed to run {}: {e}", bin.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().next_back().unwrap_or("no output").trim().to_string();
            return Err(Error::DeviceUnavailable(format!(
                "cannot open camera {}: {reason}",
                self.config.device
            )));
        }

        if output.stdout.is_empty() {
            return Err(Error::Capture("failed to grab frame".to_string()));
        }

        tracing::debug!(bytes = output.stdout.len(), "frame grabbed, camera released");
        Ok(output.stdout)
    }
}

#[async_trait]
impl Capturer for CameraCapturer {
    async fn capture(&mut self) -> Result<CapturedImage> {
        let frame = self.grab_frame().await?;

        let target = self.config.resolution;
        let path = self.config.image_path.clone();
        tracing::info!(resolution = %target, path = %path.display(), "resizing and saving image");

        tokio::task::spawn_blocking(move || resize_and_save(&frame, target, &path))
            .await
            .map_err(|e| Error::Capture(format!("image task failed: {e}")))?
    }
}

/// Decode an encoded frame, downscale it to `target` and write it as JPEG
///
/// # Errors
///
/// Returns `Capture` if the frame cannot be decoded or the file cannot be written
pub fn resize_and_save(frame: &[u8], target: Resolution, path: &Path) -> Result<CapturedImage> {
    let decoded = image::load_from_memory(frame)
        .map_err(|e| Error::Capture(format!("failed to decode frame: {e}")))?;

    let resized = decoded.resize_exact(target.width, target.height, FilterType::Triangle);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Capture(format!("failed to create {}: {e}", parent.display())))?;
    }

    resized
        .to_rgb8()
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(|e| Error::Capture(format!("failed to save image: {e}")))?;

    Ok(CapturedImage {
        path: path.to_path_buf(),
        width: target.width,
        height: target.height,
    })
}
