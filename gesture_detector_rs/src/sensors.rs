use log::{debug, info, warn};
use serde_json::Value;
use std::process::Command;
use std::time::Instant;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration};

use crate::session_log::LoggedReading;
use crate::types::{AccelSample, ProximitySample, SensorInventory};

/// One reading from the device, stamped on the monitor's monotonic clock.
#[derive(Clone, Copy, Debug)]
pub enum SensorReading {
    Accel(AccelSample),
    Proximity { timestamp: i64, sample: ProximitySample },
}

impl SensorReading {
    pub fn timestamp(&self) -> i64 {
        match self {
            SensorReading::Accel(sample) => sample.timestamp,
            SensorReading::Proximity { timestamp, .. } => *timestamp,
        }
    }

    /// The `{timestamp, accel|proximity}` record `replay` reads back.
    pub fn to_logged(&self) -> LoggedReading {
        match self {
            SensorReading::Accel(sample) => LoggedReading::accel(sample),
            SensorReading::Proximity { timestamp, sample } => {
                LoggedReading::proximity(*timestamp, sample)
            }
        }
    }
}

/// Nanoseconds since `epoch`. Never 0, which the gravity filter reads as "no history".
pub fn elapsed_ns(epoch: Instant) -> i64 {
    (epoch.elapsed().as_nanos() as i64).max(1)
}

/// Ask `termux-sensor -l` which sensors the device has.
pub fn probe_inventory() -> SensorInventory {
    let inventory = match Command::new("termux-sensor").arg("-l").output() {
        Ok(output) => inventory_from_listing(&String::from_utf8_lossy(&output.stdout)),
        Err(e) => {
            warn!("termux-sensor not available: {}", e);
            SensorInventory::none()
        }
    };
    if !inventory.accelerometer {
        warn!("No accelerometer found; motion and tilt detection stay idle");
    }
    if !inventory.proximity {
        warn!("No proximity sensor found");
    }
    inventory
}

/// Parse the `{"sensors": [...]}` listing. Vendor names vary, so matching is
/// on a lowercase substring.
pub fn inventory_from_listing(text: &str) -> SensorInventory {
    let names: Vec<String> = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("sensors").and_then(Value::as_array).cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|n| n.as_str().map(str::to_lowercase))
        .collect();

    SensorInventory {
        accelerometer: names
            .iter()
            .any(|n| n.contains("accelerometer") && !n.contains("uncalibrated")),
        proximity: names.iter().any(|n| n.contains("proximity")),
    }
}

/// Extract the first `values` array from a `termux-sensor` reading.
pub fn parse_values(text: &str) -> Option<Vec<f32>> {
    let reading: Value = serde_json::from_str(text.trim()).ok()?;
    let sensor = reading.as_object()?.values().next()?;
    let values = sensor
        .get("values")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Vec<_>>();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn read_sensor(name: &str) -> Option<Vec<f32>> {
    let output = Command::new("termux-sensor")
        .arg("-n")
        .arg("1")
        .arg("-s")
        .arg(name)
        .output()
        .ok()?;
    parse_values(&String::from_utf8_lossy(&output.stdout))
}

fn forward(tx: &Sender<SensorReading>, reading: SensorReading, label: &str, count: &mut u64) -> bool {
    match tx.try_send(reading) {
        Ok(_) => {
            *count += 1;
            if *count % 500 == 0 {
                debug!("[{}] {} samples", label, count);
            }
            true
        }
        Err(TrySendError::Closed(_)) => {
            info!("[{}] channel closed after {} samples", label, count);
            false
        }
        // Consumer is behind; drop this sample.
        Err(TrySendError::Full(_)) => true,
    }
}

pub async fn accel_loop(tx: Sender<SensorReading>, epoch: Instant, period: Duration) {
    let mut ticker = interval(period);
    let mut sample_count = 0u64;

    loop {
        ticker.tick().await;

        let Some(values) = read_sensor("accelerometer") else {
            continue;
        };
        if values.len() < 3 {
            continue;
        }
        let sample = AccelSample::new(elapsed_ns(epoch), values[0], values[1], values[2]);
        if !forward(&tx, SensorReading::Accel(sample), "accel", &mut sample_count) {
            break;
        }
    }
}

pub async fn proximity_loop(
    tx: Sender<SensorReading>,
    epoch: Instant,
    max_range: f32,
    period: Duration,
) {
    let mut ticker = interval(period);
    let mut sample_count = 0u64;

    loop {
        ticker.tick().await;

        let Some(distance) = read_sensor("proximity").and_then(|v| v.first().copied()) else {
            continue;
        };
        let reading = SensorReading::Proximity {
            timestamp: elapsed_ns(epoch),
            sample: ProximitySample::new(distance, max_range),
        };
        if !forward(&tx, reading, "proximity", &mut sample_count) {
            break;
        }
    }
}
