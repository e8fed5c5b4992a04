use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use flate2::read::GzDecoder;
use gesture_detector_rs::{
    ChannelSink, DetectorConfig, DetectorEvent, MotionDetector, SensorLog, TiltEngine,
};
use serde_json::json;

#[derive(Parser, Debug)]
struct Args {
    /// Path to a session_*.json[.gz] sensor log
    #[arg(long, conflicts_with = "log_dir")]
    log: Option<PathBuf>,

    /// Directory of logs to batch replay (processes session_*.json[.gz])
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Detector configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay in user-interest mode instead of orientation reporting
    #[arg(long, default_value_t = false)]
    interest: bool,

    /// Skip the tilt engine
    #[arg(long, default_value_t = false)]
    no_tilt: bool,

    /// Print every event as it is produced
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn load_log(path: &Path) -> anyhow::Result<SensorLog> {
    let file = File::open(path)?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        let gz = GzDecoder::new(file);
        let reader = BufReader::new(gz);
        Ok(serde_json::from_reader(reader)?)
    } else {
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn event_name(event: &DetectorEvent) -> String {
    match event {
        DetectorEvent::Motion { event } => format!("{:?}", event),
        DetectorEvent::TouchRate { direction, value } => format!("{:?}/{:?}", direction, value),
        DetectorEvent::WakeRequest { .. } => "WakeRequest".to_string(),
    }
}

fn run_once(path: &Path, config: &DetectorConfig, args: &Args) -> anyhow::Result<serde_json::Value> {
    let log = load_log(path)?;

    let (sink, events) = ChannelSink::new();
    let mut detector =
        MotionDetector::new(log.sensors, config, Box::new(sink.clone()), Box::new(sink.clone()));
    let mut tilt = TiltEngine::new(&config.tilt);
    if !args.no_tilt && log.sensors.accelerometer {
        tilt.attach(Box::new(sink));
    }
    if args.interest {
        detector.detect_user_interest();
    } else {
        detector.enable();
    }

    let mut accel_count = 0usize;
    let mut proximity_count = 0usize;
    let mut timeline = Vec::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut last_ts = 0i64;

    for r in &log.readings {
        if r.timestamp < last_ts {
            anyhow::bail!(
                "{}: timestamps go backwards at {} (previous {})",
                path.display(),
                r.timestamp,
                last_ts
            );
        }
        last_ts = r.timestamp;

        if let Some(sample) = r.accel_sample() {
            detector.on_accel_sample(&sample);
            tilt.on_accel_sample(&sample);
            accel_count += 1;
        }
        if let Some(p) = &r.proximity {
            detector.on_proximity_sample(p);
            proximity_count += 1;
        }

        for event in events.try_iter() {
            if args.verbose {
                println!("[EVENT] t={:.3}s {}", r.timestamp as f64 * 1e-9, event_name(&event));
            }
            *counts.entry(event_name(&event)).or_default() += 1;
            timeline.push(json!({ "timestamp": r.timestamp, "event": event }));
            if args.interest && matches!(event, DetectorEvent::WakeRequest { .. }) {
                detector.detect_user_interest();
            }
        }
    }

    // Ticks that fall due within the recording.
    tilt.advance_to(last_ts);
    for event in events.try_iter() {
        *counts.entry(event_name(&event)).or_default() += 1;
        timeline.push(json!({ "timestamp": last_ts, "event": event }));
    }

    Ok(json!({
        "log": path.display().to_string(),
        "sensors": log.sensors,
        "interest": args.interest,
        "accel_samples": accel_count,
        "proximity_samples": proximity_count,
        "duration_s": log.duration_s(),
        "final_state": format!("{:?}", detector.state()),
        "tilt_state": format!("{:?}", tilt.state()),
        "event_counts": counts,
        "events": timeline,
    }))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let config = match args.config.as_ref() {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };
    let mut results = Vec::new();

    if let Some(dir) = args.log_dir.as_ref() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !(name.starts_with("session_") && (name.ends_with(".json") || name.ends_with(".json.gz"))) {
                continue;
            }
            match run_once(&path, &config, &args) {
                Ok(res) => results.push(res),
                Err(e) => log::error!("Failed {}: {}", path.display(), e),
            }
        }
    } else if let Some(log) = args.log.as_ref() {
        results.push(run_once(log, &config, &args)?);
    } else {
        anyhow::bail!("Provide --log or --log-dir");
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
