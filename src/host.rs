//! Opaque host telemetry.
//!
//! Scrapes temperature, voltage, clock, throttling, memory and identity
//! data from the host and returns it as an unstructured key/value map. The
//! values are pass-through strings; no semantics are imposed on them here.

use std::collections::HashMap;
use std::fs;
use std::process::Command;
use sysinfo::System;

/// Collect a telemetry snapshot from the host.
///
/// Keys that cannot be read on this host (e.g. `vcgencmd` off-Pi) are
/// simply absent.
pub fn read_host_telemetry() -> HashMap<String, String> {
    let mut map = HashMap::new();

    if let Some(hostname) = System::host_name() {
        map.insert("hostname".to_string(), hostname);
    }
    if let Some(os) = System::name() {
        map.insert("os_name".to_string(), os);
    }
    if let Some(version) = System::os_version() {
        map.insert("os_version".to_string(), version);
    }
    if let Some(kernel) = System::kernel_version() {
        map.insert("kernel_version".to_string(), kernel);
    }
    map.insert("uptime_seconds".to_string(), System::uptime().to_string());

    let mut system = System::new();
    system.refresh_memory();
    map.insert(
        "memory_total_bytes".to_string(),
        system.total_memory().to_string(),
    );
    map.insert(
        "memory_available_bytes".to_string(),
        system.available_memory().to_string(),
    );

    // Raspberry Pi thermal zone.
    if let Ok(temp) = fs::read_to_string("/sys/class/thermal/thermal_zone0/temp") {
        map.insert("thermal_zone0_millicelsius".to_string(), temp.trim().to_string());
    }

    // vcgencmd readings, passed through verbatim.
    for (key, args) in [
        ("soc_temperature", &["measure_temp"][..]),
        ("core_voltage", &["measure_volts", "core"][..]),
        ("arm_clock_hz", &["measure_clock", "arm"][..]),
        ("throttled", &["get_throttled"][..]),
    ] {
        if let Some(value) = vcgencmd(args) {
            map.insert(key.to_string(), value);
        }
    }

    // Reachable addresses, as the host reports them.
    if let Ok(output) = Command::new("hostname").arg("-I").output() {
        if output.status.success() {
            let addresses = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !addresses.is_empty() {
                map.insert("ip_addresses".to_string(), addresses);
            }
        }
    }

    map
}

fn vcgencmd(args: &[&str]) -> Option<String> {
    let output = Command::new("vcgencmd").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
