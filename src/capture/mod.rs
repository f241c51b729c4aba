//! Continuous capture: live frames written in place into a dedicated target container.
//!
//! A [`Subscription`] binds one device connection to one target. Every applied frame *replaces*
//! the target's payload:
//!
//! - audio blocks become the raw samples
//! - video frames become per-pixel brightness with `block_width` set to the frame width
//!
//! Each subscription owns a [`StreamControl`]; pausing it drops incoming frames without touching
//! the target while the device keeps delivering. [`Subscription::stop`] disconnects the device and
//! is safe to call more than once; dropping a subscription stops it.

mod device;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::IngestionResult;
use crate::processing::pixels::{extract_into, FeatureMode};
use crate::types::DataContainer;

pub use device::{
    CaptureDevice, CaptureSettings, CaptureSource, ChannelDevice, DeviceConnection, Frame, FrameSender,
};

/// Default samples per audio block.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;
/// Default ticks between video frames.
pub const DEFAULT_INTERVAL: u32 = 1;

/// Configuration for capture subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Samples per audio block; `0` means [`DEFAULT_BLOCK_SIZE`].
    pub block_size: usize,
    /// Ticks between video frames; `0` means [`DEFAULT_INTERVAL`].
    pub interval: u32,
    pub frame_width: usize,
    pub frame_height: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            interval: DEFAULT_INTERVAL,
            frame_width: 400,
            frame_height: 300,
        }
    }
}

impl CaptureOptions {
    fn settings(&self, source: CaptureSource) -> CaptureSettings {
        CaptureSettings {
            source,
            block_size: if self.block_size == 0 { DEFAULT_BLOCK_SIZE } else { self.block_size },
            interval: self.interval.max(DEFAULT_INTERVAL),
            frame_width: self.frame_width,
            frame_height: self.frame_height,
        }
    }
}

/// Per-subscription enabled/paused switch. Clones share the same state.
#[derive(Debug, Clone)]
pub struct StreamControl {
    enabled: Arc<AtomicBool>,
}

impl Default for StreamControl {
    fn default() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl StreamControl {
    pub fn pause(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Per-frame callback; receives the updated target.
pub type FrameCallback = Box<dyn FnMut(&DataContainer) + Send>;

/// Frame counters for a subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Frames written into the target.
    pub applied: u64,
    /// Frames dropped while paused or after stop.
    pub dropped: u64,
}

/// A live binding between a device connection and a dedicated target container.
pub struct Subscription {
    settings: CaptureSettings,
    connection: Option<Box<dyn DeviceConnection>>,
    target: Option<DataContainer>,
    control: StreamControl,
    on_frame: Option<FrameCallback>,
    stats: CaptureStats,
}

impl Subscription {
    /// Connect `device` and bind it to `target`.
    ///
    /// `target` must be dedicated to this subscription. Device refusal is logged and returned;
    /// no subscription is created.
    pub fn open(
        device: &dyn CaptureDevice,
        settings: CaptureSettings,
        target: DataContainer,
        on_frame: Option<FrameCallback>,
    ) -> IngestionResult<Self> {
        let connection = device.connect(&settings).inspect_err(|e| {
            warn!(source = ?settings.source, error = %e, "capture device unavailable");
        })?;
        debug!(source = ?settings.source, block_size = settings.block_size, interval = settings.interval, "capture subscribed");
        Ok(Self {
            settings,
            connection: Some(connection),
            target: Some(target),
            control: StreamControl::default(),
            on_frame,
            stats: CaptureStats::default(),
        })
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// The target container, until the subscription is stopped.
    pub fn target(&self) -> Option<&DataContainer> {
        self.target.as_ref()
    }

    /// Handle to this subscription's enabled/paused state.
    pub fn control(&self) -> StreamControl {
        self.control.clone()
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    pub fn is_active(&self) -> bool {
        self.connection.is_some()
    }

    /// Write one frame into the target. Returns `false` if the frame was dropped.
    pub fn apply(&mut self, frame: Frame) -> bool {
        let Some(target) = self.target.as_ref() else {
            self.stats.dropped += 1;
            return false;
        };
        if !self.control.is_enabled() {
            trace!("capture paused; frame dropped");
            self.stats.dropped += 1;
            return false;
        }

        match frame {
            Frame::Samples(samples) => {
                if samples.len() != self.settings.block_size {
                    trace!(expected = self.settings.block_size, got = samples.len(), "audio block size differs");
                }
                target.set(samples);
            }
            Frame::Video(pixels) => extract_into(target, &pixels, FeatureMode::Brightness),
        }
        if let Some(cb) = self.on_frame.as_mut() {
            cb(target);
        }
        self.stats.applied += 1;
        true
    }

    /// Wait for the next frame and apply it.
    ///
    /// Returns `false` once the device has closed or the subscription was stopped. A closed
    /// device stops the subscription.
    pub async fn next(&mut self) -> bool {
        let Some(connection) = self.connection.as_mut() else {
            return false;
        };
        let frame = connection.next_frame().await;
        match frame {
            Some(frame) => {
                self.apply(frame);
                true
            }
            None => {
                debug!(source = ?self.settings.source, "capture device closed");
                self.stop();
                false
            }
        }
    }

    /// Apply frames until the device closes. Returns the number of frames applied meanwhile.
    pub async fn run(&mut self) -> u64 {
        let before = self.stats.applied;
        while self.next().await {}
        self.stats.applied - before
    }

    /// Disconnect the device and release the target. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.disconnect();
            debug!(source = ?self.settings.source, applied = self.stats.applied, "capture stopped");
        }
        self.target = None;
        self.on_frame = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("settings", &self.settings)
            .field("active", &self.is_active())
            .field("enabled", &self.control.is_enabled())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Subscribe to microphone input, writing each block of samples into `target`.
pub fn microphone(
    device: &dyn CaptureDevice,
    target: DataContainer,
    options: &CaptureOptions,
    on_frame: Option<FrameCallback>,
) -> IngestionResult<Subscription> {
    Subscription::open(device, options.settings(CaptureSource::Microphone), target, on_frame)
}

/// Subscribe to a remote audio stream played through `device`.
pub fn stream(
    device: &dyn CaptureDevice,
    locator: impl Into<String>,
    target: DataContainer,
    options: &CaptureOptions,
    on_frame: Option<FrameCallback>,
) -> IngestionResult<Subscription> {
    let source = CaptureSource::Stream {
        locator: locator.into(),
    };
    Subscription::open(device, options.settings(source), target, on_frame)
}

/// Subscribe to webcam input, writing each frame's brightness into `target`.
pub fn camera(
    device: &dyn CaptureDevice,
    target: DataContainer,
    options: &CaptureOptions,
    on_frame: Option<FrameCallback>,
) -> IngestionResult<Subscription> {
    Subscription::open(device, options.settings(CaptureSource::Camera), target, on_frame)
}

/// Owned collection of subscriptions torn down together.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription; returns its index.
    pub fn insert(&mut self, subscription: Subscription) -> usize {
        self.subscriptions.push(subscription);
        self.subscriptions.len() - 1
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Subscription> {
        self.subscriptions.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Number of subscriptions still connected.
    pub fn active(&self) -> usize {
        self.subscriptions.iter().filter(|s| s.is_active()).count()
    }

    /// Stop and remove every subscription.
    pub fn stop_all(&mut self) {
        for mut s in self.subscriptions.drain(..) {
            s.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CaptureOptions, CaptureSource, StreamControl, DEFAULT_BLOCK_SIZE};

    #[test]
    fn options_fall_back_to_defaults() {
        let opts = CaptureOptions {
            block_size: 0,
            interval: 0,
            ..Default::default()
        };
        let settings = opts.settings(CaptureSource::Microphone);
        assert_eq!(settings.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(settings.interval, 1);
        assert_eq!((settings.frame_width, settings.frame_height), (400, 300));
    }

    #[test]
    fn stream_control_clones_share_state() {
        let a = StreamControl::default();
        let b = a.clone();
        assert!(a.is_enabled());
        b.pause();
        assert!(!a.is_enabled());
        a.set_enabled(true);
        assert!(b.is_enabled());
    }
}
