//! Live dashboard demo against the in-memory backend
//!
//! Run with: cargo run --example live_dashboard
//!
//! Drives a simulated flight: a producer task pushes telemetry records and
//! camera frames into a [`FakeBackend`], while a telemetry store and a video
//! store consume them the way a UI would — seed from a snapshot, then follow
//! live pushes, printing each window update as it fans out.
//!
//! Set RUST_LOG=groundlink=debug to watch the store lifecycle.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use groundlink::{
    EventBridge, FakeBackend, FrameDispatcher, FrameFormat, Gateway, TelemetryRecord,
    TelemetryStore, Transport, VideoFrame, VideoStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let backend = Arc::new(FakeBackend::new());
    let transport: Arc<dyn Transport> = backend;
    let gateway = Gateway::new(Arc::clone(&transport));
    let bridge = EventBridge::new(Arc::clone(&transport));
    let dispatcher = FrameDispatcher::new(bridge.clone());

    // A little history so the stores have something to seed from
    for i in 0..3 {
        gateway
            .set_telemetry(
                "altimeter",
                &TelemetryRecord::new()
                    .field("alt_m", 100.0 + i as f64 * 25.0)
                    .field("vel_ms", 12.0),
            )
            .await?;
    }

    let telemetry = TelemetryStore::new(gateway.clone(), bridge.clone(), "altimeter", 10)?;
    telemetry.start().await?;
    let _t_sub = telemetry.subscribe(|window| {
        if let Some(latest) = window.last() {
            println!(
                "[telemetry] {} records, latest alt_m={}",
                window.len(),
                latest.field_f64("alt_m")
            );
        }
    });

    let video = VideoStore::new(gateway.clone(), dispatcher.clone(), "nose-cam", 5)?;
    video.start().await?;
    let _v_sub = video.subscribe(|window| {
        if let Some(latest) = window.last() {
            println!(
                "[video] {} frames buffered, latest ts={} ({}x{})",
                window.len(),
                latest.timestamp,
                latest.width,
                latest.height
            );
        }
    });

    // Simulated producer: telemetry at 10 Hz, frames at 5 Hz, for 2 seconds
    for tick in 0u64..20 {
        gateway
            .set_telemetry(
                "altimeter",
                &TelemetryRecord::new()
                    .field("alt_m", 175.0 + tick as f64 * 40.0)
                    .field("vel_ms", 40.0),
            )
            .await?;

        if tick % 2 == 0 {
            let frame = VideoFrame::new(tick * 100, 640, 480, FrameFormat::Jpeg, fake_jpeg(tick));
            gateway.add_video_frame("nose-cam", &frame).await?;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    telemetry.stop();
    video.stop();
    println!(
        "done: {} telemetry records retained, {} frames retained",
        telemetry.all_data().len(),
        video.all_frames().len()
    );
    Ok(())
}

fn fake_jpeg(tick: u64) -> Bytes {
    Bytes::from(vec![0xFF, 0xD8, tick as u8, 0xFF, 0xD9])
}
