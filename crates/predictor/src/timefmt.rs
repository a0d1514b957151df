//! `H:MM:SS` race-time strings.

use crate::errors::AppError;

/// Parses `H:MM:SS` into seconds.
pub fn parse_hms(time: &str) -> Result<f64, AppError> {
    let invalid = || AppError::invalid(format!("expected time as H:MM:SS, got {time:?}"));

    let parts: Vec<&str> = time.trim().split(':').collect();
    let [h, m, s] = parts.as_slice() else {
        return Err(invalid());
    };
    let h: u32 = h.parse().map_err(|_| invalid())?;
    let m: u32 = m.parse().map_err(|_| invalid())?;
    let s: u32 = s.parse().map_err(|_| invalid())?;
    if m >= 60 || s >= 60 {
        return Err(invalid());
    }

    Ok(f64::from(h) * 3600.0 + f64::from(m) * 60.0 + f64::from(s))
}

/// Formats seconds as `H:MM:SS`, truncating fractions. Non-finite values
/// (the zero-finisher sentinel) render as `DNF`.
pub fn format_hms(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "DNF".to_string();
    }
    let total = seconds.max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h}:{m:02}:{s:02}")
}
