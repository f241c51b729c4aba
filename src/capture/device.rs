use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::channel::mpsc;
use futures::future::{BoxFuture, FutureExt};
use futures::StreamExt;

use crate::error::{IngestionError, IngestionResult};
use crate::processing::pixels::PixelBuffer;

/// What a subscription captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    /// Live microphone input.
    Microphone,
    /// A remote audio stream played through the device.
    Stream { locator: String },
    /// Live webcam input.
    Camera,
}

/// Parameters handed to the device when a subscription connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub source: CaptureSource,
    /// Samples per audio block.
    pub block_size: usize,
    /// Ticks between video frames. Pacing is the device's job.
    pub interval: u32,
    pub frame_width: usize,
    pub frame_height: usize,
}

/// One delivery from a device.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// One block of mono (first channel) audio samples.
    Samples(Vec<f32>),
    /// One RGBA video frame.
    Video(PixelBuffer),
}

/// A capture device (microphone, webcam, stream player).
pub trait CaptureDevice: Send + Sync {
    /// Open a connection. Devices that cannot serve `settings.source` fail with
    /// [`crate::ErrorKind::UnavailableCapability`].
    fn connect(&self, settings: &CaptureSettings) -> IngestionResult<Box<dyn DeviceConnection>>;
}

/// An open device connection delivering frames.
pub trait DeviceConnection: Send {
    /// The next frame, or `None` once the device has closed.
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Frame>>;

    /// Release the device. Must tolerate repeated calls.
    fn disconnect(&mut self);
}

/// Sending half of a [`ChannelDevice`]. Frames sent after disconnect are discarded.
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::UnboundedSender<Frame>,
}

impl FrameSender {
    /// Queue a frame. Returns `false` once the connection is gone.
    pub fn send(&self, frame: Frame) -> bool {
        self.tx.unbounded_send(frame).is_ok()
    }

    /// Signal end of capture.
    pub fn close(&self) {
        self.tx.close_channel();
    }
}

/// A device fed from code (a capture thread, a test) through a [`FrameSender`].
///
/// It hands out a single connection; later connects fail as unavailable.
#[derive(Debug)]
pub struct ChannelDevice {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Frame>>>,
    connected: Arc<AtomicBool>,
}

impl ChannelDevice {
    pub fn new() -> (FrameSender, Self) {
        let (tx, rx) = mpsc::unbounded();
        let device = Self {
            rx: Mutex::new(Some(rx)),
            connected: Arc::new(AtomicBool::new(false)),
        };
        (FrameSender { tx }, device)
    }

    /// Whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for ChannelDevice {
    fn connect(&self, _settings: &CaptureSettings) -> IngestionResult<Box<dyn DeviceConnection>> {
        let rx = self
            .rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| IngestionError::unavailable("channel device already connected"))?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(Box::new(ChannelConnection {
            rx: Some(rx),
            connected: Arc::clone(&self.connected),
        }))
    }
}

struct ChannelConnection {
    rx: Option<mpsc::UnboundedReceiver<Frame>>,
    connected: Arc<AtomicBool>,
}

impl DeviceConnection for ChannelConnection {
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Frame>> {
        async move {
            match self.rx.as_mut() {
                Some(rx) => rx.next().await,
                None => None,
            }
        }
        .boxed()
    }

    fn disconnect(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}
