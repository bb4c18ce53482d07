//! Generate command - write a simulated day of samples.

use anyhow::{Context, Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tlog_store::{DayBuffer, LogDir};
use tlog_types::{LogDate, Reading};

/// Arguments for the generate command.
pub struct GenerateArgs {
    pub date: LogDate,
    pub seed: Option<u64>,
    /// Last minute to fill, inclusive.
    pub until: u16,
    pub hysteresis: f32,
    pub force: bool,
    pub quiet: bool,
}

pub fn cmd_generate(dir: &LogDir, args: GenerateArgs) -> Result<()> {
    let GenerateArgs {
        date,
        seed,
        until,
        hysteresis,
        force,
        quiet,
    } = args;

    if !hysteresis.is_finite() || hysteresis < 0.0 {
        bail!("Hysteresis must be a non-negative number of degrees");
    }
    if dir.exists(date) && !force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            dir.path_for(date).display()
        );
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut buffer = simulate_day(date, until, hysteresis, &mut rng)?;

    dir.ensure_root()
        .with_context(|| format!("Failed to create {}", dir.root().display()))?;
    dir.save(&mut buffer)
        .with_context(|| format!("Failed to write {}", date.filename()))?;

    if !quiet {
        let stats = buffer.stats();
        println!(
            "Wrote {} ({} samples, {:.1}-{:.1} °C, heater on {} min)",
            dir.path_for(date).display(),
            buffer.num_samples(),
            stats.min_temperature,
            stats.max_temperature,
            stats.heater_on_minutes
        );
    }
    Ok(())
}

/// Thermostat bank and setpoint in effect at a minute of day.
fn schedule(minute: u16) -> (u8, f32) {
    match minute {
        360..1320 => (1, 20.0),
        _ => (0, 16.0),
    }
}

/// Baseline room temperature: cool night, morning warm-up, steady day,
/// cooler evening.
fn baseline(minute: u16) -> f32 {
    let m = f32::from(minute);
    match minute {
        0..360 => 16.0,
        360..480 => 16.0 + 5.0 * (m - 360.0) / 120.0,
        480..1020 => 20.5,
        1020..1320 => 18.0,
        _ => 16.0,
    }
}

/// Fill minutes `0..=until` of a fresh buffer for `date`.
fn simulate_day<R: Rng>(
    date: LogDate,
    until: u16,
    hysteresis: f32,
    rng: &mut R,
) -> tlog_store::Result<DayBuffer> {
    let mut buffer = DayBuffer::for_date(date)?;
    let mut heater = false;
    let mut humidity: i16 = 50;
    let mut pressure: f32 = 1013.0;

    for minute in 0..=until {
        let (bank, setpoint) = schedule(minute);
        let temperature = baseline(minute) + rng.random_range(-0.25..=0.25);

        if temperature < setpoint {
            heater = true;
        } else if temperature >= setpoint + hysteresis {
            heater = false;
        }

        humidity = (humidity + rng.random_range(-1..=1)).clamp(40, 60);
        pressure = (pressure + rng.random_range(-0.3..=0.3)).clamp(980.0, 1020.0);

        let reading = Reading {
            temperature,
            humidity: u8::try_from(humidity).ok(),
            pressure: Some(pressure),
            setpoint: Some(setpoint),
            relay_on: heater,
            manual_mode: false,
            exception_active: false,
            active_bank: bank,
        };
        buffer.insert(reading.to_sample(minute))?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> LogDate {
        LogDate::new(2025, 12, 21).unwrap()
    }

    #[test]
    fn test_baseline_profile() {
        assert_eq!(baseline(0), 16.0);
        assert_eq!(baseline(420), 18.5);
        assert_eq!(baseline(600), 20.5);
        assert_eq!(baseline(1100), 18.0);
        assert_eq!(baseline(1439), 16.0);
    }

    #[test]
    fn test_full_day_is_plausible() {
        let mut rng = StdRng::seed_from_u64(7);
        let buffer = simulate_day(date(), 1439, 0.3, &mut rng).unwrap();

        assert_eq!(buffer.num_samples(), 1440);
        let stats = buffer.stats();
        assert_eq!(stats.valid_samples, 1440);
        assert!(stats.min_temperature >= 15.7);
        assert!(stats.max_temperature <= 21.3);
        assert!(stats.heater_on_minutes > 0);
        assert!(stats.heater_on_minutes < 1440);

        for sample in buffer.samples() {
            let hum = sample.humidity_percent().unwrap();
            assert!((40..=60).contains(&hum));
            let press = sample.pressure_hpa().unwrap();
            assert!((980.0..=1020.0).contains(&press));
        }
    }

    #[test]
    fn test_heater_follows_schedule() {
        let mut rng = StdRng::seed_from_u64(1);
        let buffer = simulate_day(date(), 1439, 0.3, &mut rng).unwrap();

        // Evening sits well below the 20 °C day setpoint.
        let evening = buffer.get(1100).unwrap();
        assert!(evening.relay_on());
        assert_eq!(evening.active_bank, 1);
        assert_eq!(evening.setpoint_celsius(), Some(20.0));

        let night = buffer.get(1380).unwrap();
        assert_eq!(night.active_bank, 0);
        assert_eq!(night.setpoint_celsius(), Some(16.0));
    }

    #[test]
    fn test_partial_day_stops_at_until() {
        let mut rng = StdRng::seed_from_u64(3);
        let buffer = simulate_day(date(), 599, 0.3, &mut rng).unwrap();

        assert_eq!(buffer.num_samples(), 600);
        assert!(buffer.get(599).is_ok());
        assert!(buffer.get(600).unwrap_err().is_not_found());
    }

    #[test]
    fn test_same_seed_same_day() {
        let a = simulate_day(date(), 1439, 0.3, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = simulate_day(date(), 1439, 0.3, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a.samples(), b.samples());
    }
}
