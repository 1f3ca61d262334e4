// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{RawStackConfig, StackConfig};
use crate::engine::readiness::Readiness;
use crate::errors::{DevstackError, Result};

impl TryFrom<RawStackConfig> for StackConfig {
    type Error = DevstackError;

    fn try_from(raw: RawStackConfig) -> std::result::Result<Self, Self::Error> {
        validate_programs(&raw)?;
        let shutdown_grace = duration_field("stack.shutdown_grace", &raw.stack.shutdown_grace)?;
        let readiness = readiness_from(&raw)?;

        Ok(StackConfig {
            shutdown_grace,
            datastore: raw.datastore,
            readiness,
            typegen: raw.typegen,
            backend: raw.backend,
            client: raw.client,
            tests: raw.tests,
            proxy: raw.proxy,
        })
    }
}

fn validate_programs(cfg: &RawStackConfig) -> Result<()> {
    let programs = [
        ("datastore.program", &cfg.datastore.program),
        ("typegen.runner", &cfg.typegen.runner),
        ("backend.compiler", &cfg.backend.compiler),
        ("backend.runtime", &cfg.backend.runtime),
        ("client.package_manager", &cfg.client.package_manager),
        ("tests.package_manager", &cfg.tests.package_manager),
        ("proxy.program", &cfg.proxy.program),
        ("backend.mode_variable", &cfg.backend.mode_variable),
    ];
    for (field, value) in programs {
        if value.trim().is_empty() {
            return Err(DevstackError::Config(format!("{field} must not be empty")));
        }
    }
    Ok(())
}

fn readiness_from(cfg: &RawStackConfig) -> Result<Readiness> {
    let ds = &cfg.datastore;
    let Some(address) = ds.ready_address.as_ref() else {
        let delay = duration_field("datastore.startup_delay", &ds.startup_delay)?;
        return Ok(Readiness::FixedDelay(delay));
    };

    validate_address(address)?;
    let interval = duration_field("datastore.ready_interval", &ds.ready_interval)?;
    let timeout = duration_field("datastore.ready_timeout", &ds.ready_timeout)?;

    if interval.is_zero() {
        return Err(DevstackError::Config(
            "datastore.ready_interval must be greater than zero".to_string(),
        ));
    }
    if timeout < interval {
        return Err(DevstackError::Config(format!(
            "datastore.ready_timeout ({timeout:?}) must be at least ready_interval ({interval:?})"
        )));
    }

    Ok(Readiness::Probe {
        address: address.clone(),
        interval,
        timeout,
    })
}

fn validate_address(address: &str) -> Result<()> {
    let port = address
        .rsplit_once(':')
        .filter(|(host, _)| !host.is_empty())
        .map(|(_, port)| port);
    match port.map(str::parse::<u16>) {
        Some(Ok(_)) => Ok(()),
        _ => Err(DevstackError::Config(format!(
            "datastore.ready_address must be host:port (got '{address}')"
        ))),
    }
}

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| DevstackError::Config(format!("{field}: {e}")))
}

/// Parse durations written as an integer plus unit: `250ms`, `3s`, `1m`, `2h`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' needs a unit (ms, s, m or h)"))?;
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("duration '{s}' does not start with a number"));
    }

    let amount: u64 = digits
        .parse()
        .map_err(|e| format!("duration '{s}': {e}"))?;
    let millis_per_unit: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        other => return Err(format!("duration '{s}': unknown unit '{other}'")),
    };

    amount
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
