use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration};

use gesture_detector_rs::sensors::{self, SensorReading};
use gesture_detector_rs::{
    ChannelSink, DetectorConfig, DetectorEvent, MotionDetector, SensorLog, TiltEngine,
};

#[derive(Parser, Debug)]
#[command(name = "gesture_monitor")]
#[command(about = "Live face-up/face-down, motion and tilt gesture monitor", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Detector configuration (JSON); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Watch for user interest (wake requests) instead of reporting orientation
    #[arg(long)]
    interest: bool,

    /// Disable the tilt engine
    #[arg(long)]
    no_tilt: bool,

    /// Proximity sensor maximum range (cm)
    #[arg(long, default_value = "5.0")]
    proximity_range: f32,

    /// Accelerometer polling period (ms)
    #[arg(long, default_value = "20")]
    period_ms: u64,

    /// Write readings and events here on exit; name it session_*.json to batch
    /// it with `replay --log-dir`
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct LoggedEvent {
    time: String,
    timestamp_ns: i64,
    #[serde(flatten)]
    event: DetectorEvent,
}

#[derive(Serialize)]
struct SessionLog {
    started: String,
    accel_samples: u64,
    proximity_samples: u64,
    #[serde(flatten)]
    recording: SensorLog,
    events: Vec<LoggedEvent>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DetectorConfig::default(),
    };

    println!("[{}] Gesture Monitor Starting", ts_now());
    println!("  Duration: {} seconds (0=continuous)", args.duration);
    println!("  Mode: {}", if args.interest { "interest" } else { "orientation" });
    println!("  Tilt: {}", if args.no_tilt { "off" } else { "on" });

    let inventory = sensors::probe_inventory();
    let (sink, events) = ChannelSink::new();
    let mut detector =
        MotionDetector::new(inventory, &config, Box::new(sink.clone()), Box::new(sink.clone()));
    let mut tilt = TiltEngine::new(&config.tilt);
    if !args.no_tilt && inventory.accelerometer {
        tilt.attach(Box::new(sink));
    }

    if args.interest {
        detector.detect_user_interest();
    } else {
        detector.enable();
    }

    let epoch = Instant::now();
    let (reading_tx, mut reading_rx) = mpsc::channel::<SensorReading>(500);
    let mut handles = Vec::new();
    if inventory.accelerometer {
        handles.push(tokio::spawn(sensors::accel_loop(
            reading_tx.clone(),
            epoch,
            Duration::from_millis(args.period_ms),
        )));
    }
    if inventory.proximity {
        handles.push(tokio::spawn(sensors::proximity_loop(
            reading_tx.clone(),
            epoch,
            args.proximity_range,
            Duration::from_millis(200),
        )));
    }
    drop(reading_tx);

    let start = Utc::now();
    let stop_at = (args.duration > 0)
        .then(|| tokio::time::Instant::from_std(epoch) + Duration::from_secs(args.duration));
    let mut log = SessionLog {
        started: start.to_rfc3339(),
        accel_samples: 0,
        proximity_samples: 0,
        recording: SensorLog::new(inventory),
        events: Vec::new(),
    };

    loop {
        // Far enough away to never fire.
        let idle = tokio::time::Instant::now() + Duration::from_secs(3600);
        let tick_at = tilt
            .next_deadline()
            .map(|ns| tokio::time::Instant::from_std(epoch) + Duration::from_nanos(ns.max(0) as u64))
            .unwrap_or(idle);

        tokio::select! {
            reading = reading_rx.recv() => {
                let Some(reading) = reading else {
                    warn!("All sensor loops ended");
                    break;
                };
                log.recording.push(reading.to_logged());
                match reading {
                    SensorReading::Accel(sample) => {
                        log.accel_samples += 1;
                        detector.on_accel_sample(&sample);
                        tilt.on_accel_sample(&sample);
                    }
                    SensorReading::Proximity { sample, .. } => {
                        log.proximity_samples += 1;
                        detector.on_proximity_sample(&sample);
                    }
                }
            }
            _ = sleep_until(tick_at) => {
                tilt.advance_to(sensors::elapsed_ns(epoch));
            }
            _ = sleep_until(stop_at.unwrap_or(idle)), if stop_at.is_some() => {
                println!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
        }

        for event in events.try_iter() {
            let logged = LoggedEvent {
                time: ts_now(),
                timestamp_ns: sensors::elapsed_ns(epoch),
                event,
            };
            println!("{}", serde_json::to_string(&logged)?);
            if args.interest && matches!(event, DetectorEvent::WakeRequest { .. }) {
                info!("Wake requested; watching again");
                detector.detect_user_interest();
            }
            log.events.push(logged);
        }
    }

    for handle in &handles {
        handle.abort();
    }
    detector.disable();
    tilt.detach();

    println!("\n=== Session ===");
    println!("Accel samples: {}", log.accel_samples);
    println!("Proximity samples: {}", log.proximity_samples);
    println!("Recorded: {:.1}s", log.recording.duration_s());
    println!("Events: {}", log.events.len());

    if let Some(path) = &args.output {
        // The two sensor loops race on send; replay needs non-decreasing time.
        log.recording.readings.sort_by_key(|r| r.timestamp);
        let json = serde_json::to_string_pretty(&log)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("[{}] Saved session to {}", ts_now(), path.display());
    }

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S%.3f").to_string()
}
