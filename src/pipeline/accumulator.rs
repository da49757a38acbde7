//! Frame accumulation: collect a bounded number of successive sensor frames,
//! move each into the reference frame using its acquisition pose, and
//! concatenate them into one cloud.
//!
//! The accumulator is the only stage that suspends on external input. It
//! borrows the frame source exclusively for the duration of the call, which
//! is both the single-flight discipline (no second run can accumulate from
//! the same source while one is in flight) and the guaranteed release: the
//! borrow ends when the function returns, on success or failure alike.

use crate::{Iso3, PointCloud, PointCloudFeatures, ReconError, Result};
use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};

/// A single sensor capture: a point cloud in the sensor frame plus the rigid
/// transform from the sensor frame to the reference frame at acquisition
/// time.
#[derive(Debug, Clone)]
pub struct Frame {
    pub cloud: PointCloud,
    pub pose: Iso3,
}

impl Frame {
    pub fn new(cloud: PointCloud, pose: Iso3) -> Self {
        Self { cloud, pose }
    }

    /// Consume the frame, returning its cloud transformed into the reference
    /// frame.
    fn into_reference_frame(mut self) -> PointCloud {
        self.cloud.transform_by(&self.pose);
        self.cloud
    }
}

/// A live stream of sensor frames. `next_frame` blocks up to `timeout` for
/// the next capture and returns `None` when the stream has ended or nothing
/// arrived in time.
pub trait FrameSource {
    fn next_frame(&mut self, timeout: Duration) -> Option<Frame>;
}

/// A frame source fed by a crossbeam channel, the usual way to couple the
/// pipeline to a sensor driver thread.
pub struct ChannelFrameSource {
    receiver: Receiver<Frame>,
}

impl ChannelFrameSource {
    pub fn new(receiver: Receiver<Frame>) -> Self {
        Self { receiver }
    }
}

impl FrameSource for ChannelFrameSource {
    fn next_frame(&mut self, timeout: Duration) -> Option<Frame> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

/// Collect `frame_count` successive frames from the source and merge them
/// into a single cloud in the reference frame. The deadline covers the whole
/// collection, not each frame individually.
///
/// Fails with [`ReconError::InsufficientFrames`] when the stream ends or the
/// deadline passes first. No retry is attempted here; whether to re-run the
/// pipeline is the caller's decision.
///
/// # Arguments
///
/// * `source`: the live frame stream, borrowed exclusively for this call
/// * `frame_count`: how many frames to collect, must be at least 1
/// * `timeout`: deadline for the whole collection
///
/// returns: Result<PointCloud, ReconError>
pub fn accumulate(
    source: &mut dyn FrameSource,
    frame_count: usize,
    timeout: Duration,
) -> Result<PointCloud> {
    if frame_count == 0 {
        return Err(ReconError::Config(
            "cannot accumulate zero frames".to_string(),
        ));
    }

    let deadline = Instant::now() + timeout;
    let mut accumulated: Option<PointCloud> = None;
    let mut received = 0;

    while received < frame_count {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ReconError::InsufficientFrames {
                received,
                requested: frame_count,
            });
        }

        let Some(frame) = source.next_frame(remaining) else {
            return Err(ReconError::InsufficientFrames {
                received,
                requested: frame_count,
            });
        };

        let cloud = frame.into_reference_frame();
        log::debug!("accumulated frame {} with {} points", received, cloud.len());

        accumulated = match accumulated {
            None => Some(cloud),
            Some(mut acc) => {
                acc.merge(cloud)?;
                Some(acc)
            }
        };
        received += 1;
    }

    accumulated.ok_or_else(|| "accumulation finished without a cloud".into())
}
