use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::executor::block_on;

use datatree_ingest::capture::{
    camera, microphone, stream, CaptureDevice, CaptureOptions, CaptureSettings, CaptureSource, ChannelDevice,
    DeviceConnection, Frame, SubscriptionSet,
};
use datatree_ingest::processing::PixelBuffer;
use datatree_ingest::types::{DataContainer, Scalar};
use datatree_ingest::{ErrorKind, IngestionError, IngestionResult};

fn block(value: f32, len: usize) -> Frame {
    Frame::Samples(vec![value; len])
}

fn first_value(c: &DataContainer) -> Option<f64> {
    c.read_values(|v| v.first().and_then(Scalar::as_f64)).flatten()
}

/// A device with no capture support at all.
struct NoDevice;

impl CaptureDevice for NoDevice {
    fn connect(&self, settings: &CaptureSettings) -> IngestionResult<Box<dyn DeviceConnection>> {
        Err(IngestionError::UnavailableCapability {
            capability: format!("{:?}", settings.source),
        })
    }
}

#[test]
fn paused_frames_leave_the_target_untouched() {
    let (tx, device) = ChannelDevice::new();
    let target = DataContainer::new();
    let options = CaptureOptions {
        block_size: 512,
        ..Default::default()
    };
    let mut sub = microphone(&device, target.clone(), &options, None).unwrap();
    assert_eq!(sub.settings().block_size, 512);

    for value in [0.1, 0.2, 0.3] {
        assert!(tx.send(block(value, 512)));
    }

    assert!(block_on(sub.next()));
    assert_eq!(target.len(), 512);
    assert_eq!(first_value(&target), Some(f64::from(0.1_f32)));

    sub.control().pause();
    assert!(block_on(sub.next()));
    assert_eq!(first_value(&target), Some(f64::from(0.1_f32)));

    sub.control().resume();
    assert!(block_on(sub.next()));
    assert_eq!(first_value(&target), Some(f64::from(0.3_f32)));
    assert_eq!(target.len(), 512);

    let stats = sub.stats();
    assert_eq!((stats.applied, stats.dropped), (2, 1));
}

#[test]
fn callback_sees_every_applied_frame() {
    let (tx, device) = ChannelDevice::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = Arc::clone(&calls);
    let target = DataContainer::new();

    let mut sub = microphone(
        &device,
        target.clone(),
        &CaptureOptions::default(),
        Some(Box::new(move |c: &DataContainer| {
            assert_eq!(c.len(), 4);
            calls2.fetch_add(1, Ordering::SeqCst);
        })),
    )
    .unwrap();

    tx.send(block(0.5, 4));
    tx.send(block(0.25, 4));
    tx.close();

    assert_eq!(block_on(sub.run()), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // Device closed: the subscription stopped itself.
    assert!(!sub.is_active());
    assert!(!device.is_connected());
    assert_eq!(first_value(&target), Some(0.25));
}

#[test]
fn camera_frames_become_brightness() {
    let (tx, device) = ChannelDevice::new();
    let target = DataContainer::new();
    let mut sub = camera(&device, target.clone(), &CaptureOptions::default(), None).unwrap();
    assert_eq!(sub.settings().source, CaptureSource::Camera);

    let frame = PixelBuffer::new(2, 1, vec![255, 255, 255, 255, 0, 0, 0, 255]).unwrap();
    tx.send(Frame::Video(frame));
    assert!(block_on(sub.next()));

    assert_eq!(target.label().as_deref(), Some("brightness"));
    assert_eq!(target.block_width(), Some(2));
    assert_eq!(target.values().unwrap()[1], Scalar::Number(0.0));
}

#[test]
fn stop_is_idempotent_and_disconnects() {
    let (tx, device) = ChannelDevice::new();
    let mut sub = stream(
        &device,
        "https://radio.example.org/live.mp3",
        DataContainer::new(),
        &CaptureOptions::default(),
        None,
    )
    .unwrap();
    assert!(device.is_connected());

    sub.stop();
    sub.stop();
    assert!(!sub.is_active());
    assert!(sub.target().is_none());
    assert!(!device.is_connected());

    // Frames after stop go nowhere.
    assert!(!tx.send(block(1.0, 8)));
    assert!(!block_on(sub.next()));
    assert!(!sub.apply(block(1.0, 8)));
}

#[test]
fn a_device_connects_once() {
    let (_tx, device) = ChannelDevice::new();
    let _first = microphone(&device, DataContainer::new(), &CaptureOptions::default(), None).unwrap();
    let err = microphone(&device, DataContainer::new(), &CaptureOptions::default(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnavailableCapability);
}

#[test]
fn unsupported_device_fails_with_unavailable_capability() {
    let err = camera(&NoDevice, DataContainer::new(), &CaptureOptions::default(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnavailableCapability);
}

#[test]
fn subscriptions_pause_independently() {
    let (tx_a, dev_a) = ChannelDevice::new();
    let (tx_b, dev_b) = ChannelDevice::new();
    let target_a = DataContainer::new();
    let target_b = DataContainer::new();

    let mut set = SubscriptionSet::new();
    let a = set.insert(microphone(&dev_a, target_a.clone(), &CaptureOptions::default(), None).unwrap());
    let b = set.insert(microphone(&dev_b, target_b.clone(), &CaptureOptions::default(), None).unwrap());
    assert_eq!(set.active(), 2);

    set.get_mut(a).unwrap().control().pause();
    tx_a.send(block(0.5, 2));
    tx_b.send(block(0.5, 2));
    assert!(block_on(set.get_mut(a).unwrap().next()));
    assert!(block_on(set.get_mut(b).unwrap().next()));

    assert!(target_a.is_empty());
    assert_eq!(target_b.len(), 2);

    set.stop_all();
    assert!(set.is_empty());
    assert!(!dev_a.is_connected());
    assert!(!dev_b.is_connected());
}

#[test]
fn dropping_a_subscription_releases_the_device() {
    let (_tx, device) = ChannelDevice::new();
    {
        let _sub = microphone(&device, DataContainer::new(), &CaptureOptions::default(), None).unwrap();
        assert!(device.is_connected());
    }
    assert!(!device.is_connected());
}
