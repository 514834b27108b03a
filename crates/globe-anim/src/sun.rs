//! Sun direction from the time of day.
//!
//! The subsolar point (where the sun is directly overhead) is computed from
//! UTC time and day of year, then projected with the same convention as
//! everything else on the globe.

use glam::DVec3;

use crate::geo::{GeoCoordinate, project};

/// Earth's axial tilt in degrees.
const AXIAL_TILT_DEG: f64 = 23.44;

pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const SECONDS_PER_DAY: f64 = 86400.0;

/// Sun declination in degrees for a day of year (1-366).
///
/// Ranges from -23.44° near the December solstice to +23.44° near June's.
pub fn declination_deg(day_of_year: u32) -> f64 {
    let day = f64::from(day_of_year);
    // +10 shifts the minimum onto the winter solstice (~day 355).
    let angle = (360.0 / 365.0 * (day + 10.0)).to_radians();
    -AXIAL_TILT_DEG * angle.cos()
}

/// The point on the globe where the sun is overhead.
///
/// At 12:00 UTC the sun is over the prime meridian; it moves west 15° an hour.
pub fn subsolar_point(utc_seconds: f64, day_of_year: u32) -> GeoCoordinate {
    let utc_hours = utc_seconds.rem_euclid(SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let longitude = ((12.0 - utc_hours) * 15.0 + 180.0).rem_euclid(360.0) - 180.0;
    GeoCoordinate::new(declination_deg(day_of_year), longitude)
}

/// Unit vector from the globe centre toward the sun.
pub fn sun_direction(utc_seconds: f64, day_of_year: u32) -> DVec3 {
    let point = subsolar_point(utc_seconds, day_of_year);
    project(point.latitude, point.longitude, 1.0, 0.0)
}

/// Day of year (1-366) for a count of days since 1970-01-01.
pub fn day_of_year_from_epoch_days(days: i64) -> u32 {
    // Howard Hinnant's civil-from-days.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let doy_march = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy_march + 2) / 153;
    let day = doy_march - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days_before_month = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let mut doy = days_before_month[(month - 1) as usize] + day as u32;
    if leap && month > 2 {
        doy += 1;
    }
    doy
}
