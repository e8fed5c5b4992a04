/// Example: Synthetic Gesture Session
///
/// Generates a scripted accelerometer trace (rest face-up, pick up and shake,
/// hold tilted forward, level out, turn face-down), runs it through the motion
/// detector and tilt engine, and prints the resulting events.
///
/// With `--write <path>` the trace is also saved as a gzipped sensor log that
/// the `replay` binary accepts.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use flate2::write::GzEncoder;
use flate2::Compression;
use gesture_detector_rs::{
    AccelSample, ChannelSink, DetectorConfig, LoggedReading, MotionDetector, SensorInventory,
    SensorLog, TiltEngine,
};

#[derive(Parser, Debug)]
struct Args {
    /// Save the generated trace as session log (.json.gz)
    #[arg(long)]
    write: Option<PathBuf>,
}

const STEP_NS: i64 = 20_000_000; // 50 Hz
const G: f32 = 9.81;

fn hold(trace: &mut Vec<AccelSample>, t: &mut i64, seconds: f64, x: f32, y: f32, z: f32) {
    let steps = (seconds * 1e9 / STEP_NS as f64) as usize;
    for _ in 0..steps {
        trace.push(AccelSample::new(*t, x, y, z));
        *t += STEP_NS;
    }
}

fn shake(trace: &mut Vec<AccelSample>, t: &mut i64, seconds: f64) {
    let steps = (seconds * 1e9 / STEP_NS as f64) as usize;
    for i in 0..steps {
        let x = if i % 2 == 0 { 6.0 } else { 0.0 };
        trace.push(AccelSample::new(*t, x, 0.0, G));
        *t += STEP_NS;
    }
}

fn build_trace() -> Vec<AccelSample> {
    let mut trace = Vec::new();
    let mut t = 1_000_000_000i64;

    hold(&mut trace, &mut t, 2.0, 0.0, 0.0, G);
    shake(&mut trace, &mut t, 1.5);
    let tilt = 40f32.to_radians();
    hold(&mut trace, &mut t, 3.2, G * tilt.sin(), 0.0, G * tilt.cos());
    hold(&mut trace, &mut t, 1.5, 0.0, 0.0, G);
    hold(&mut trace, &mut t, 2.0, 0.0, 0.0, -G);
    trace
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    println!("=== Synthetic Gesture Session ===\n");

    let trace = build_trace();
    let config = DetectorConfig::default();
    let (sink, events) = ChannelSink::new();
    let mut detector = MotionDetector::new(
        SensorInventory::all(),
        &config,
        Box::new(sink.clone()),
        Box::new(sink.clone()),
    );
    let mut tilt = TiltEngine::with_listener(&config.tilt, Box::new(sink));
    detector.enable();

    let t0 = trace.first().map(|s| s.timestamp).unwrap_or(0);
    for sample in &trace {
        detector.on_accel_sample(sample);
        tilt.on_accel_sample(sample);
        for event in events.try_iter() {
            println!(
                "  t={:6.2}s  {}",
                (sample.timestamp - t0) as f64 * 1e-9,
                serde_json::to_string(&event)?
            );
        }
    }

    println!("\n{} samples, final orientation {:?}", trace.len(), detector.prior_type());

    if let Some(path) = &args.write {
        let mut log = SensorLog::new(SensorInventory::all());
        for sample in &trace {
            log.push(LoggedReading::accel(sample));
        }

        let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());
        encoder.write_all(serde_json::to_string(&log)?.as_bytes())?;
        encoder.finish()?;
        println!("Trace written to {}", path.display());
    }

    Ok(())
}
