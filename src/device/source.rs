use std::{future::Future, io::ErrorKind, path::Path};

use anyhow::{Context as _, Result, bail};
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt as _},
};

use crate::device::{FRAME_LEN, RawFrame};

/// Something that yields one raw 8-byte frame per call.
///
/// Each call may wait indefinitely for the device. An error is a transport
/// failure and is not retried by callers in this crate.
///
/// A pull dropped mid-read may have consumed part of a frame; the stream is
/// then out of step and the source must be reopened.
pub trait FrameSource {
    fn read_frame(&mut self) -> impl Future<Output = Result<RawFrame>>;
}

#[derive(Debug)]
pub struct HidrawFrameSource<R> {
    reader: R,
}

impl<R: AsyncRead + Unpin> HidrawFrameSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: AsyncRead + Unpin> FrameSource for HidrawFrameSource<R> {
    async fn read_frame(&mut self) -> Result<RawFrame> {
        let mut buf = [0u8; FRAME_LEN];
        match self.reader.read_exact(&mut buf).await {
            Ok(_) => Ok(RawFrame(buf)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                bail!("short read: device closed before a full {FRAME_LEN}-byte frame")
            }
            Err(e) => Err(e).context("failed to read frame from device"),
        }
    }
}

pub async fn open_hidraw(path: impl AsRef<Path>) -> Result<HidrawFrameSource<File>> {
    let path = path.as_ref();
    let file = File::open(path)
        .await
        .with_context(|| format!("failed to open device: {}", path.display()))?;

    log::info!("opened device {}", path.display());

    Ok(HidrawFrameSource::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_consecutive_frames() {
        let bytes: &[u8] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        let mut source = HidrawFrameSource::new(bytes);

        assert_eq!(
            source.read_frame().await.unwrap(),
            RawFrame([1, 2, 3, 4, 5, 6, 7, 8])
        );
        assert_eq!(
            source.read_frame().await.unwrap(),
            RawFrame([9, 10, 11, 12, 13, 14, 15, 16])
        );
        assert!(source.read_frame().await.is_err());
    }

    #[tokio::test]
    async fn short_read_is_an_error() {
        let bytes: &[u8] = &[1, 2, 3];
        let mut source = HidrawFrameSource::new(bytes);

        let err = source.read_frame().await.unwrap_err();
        assert!(format!("{err:#}").contains("short read"));
    }

    #[tokio::test]
    async fn missing_device_fails_to_open() {
        let err = open_hidraw("/nonexistent/hidraw99").await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to open device"));
    }
}
