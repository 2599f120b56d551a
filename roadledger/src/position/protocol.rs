//! GPS sentence parsing for UDP position feeds.
//!
//! Supports:
//! - **NMEA 0183 RMC** (`$GPRMC`, `$GNRMC`, ...) - position, UTC date and time, validity
//! - **NMEA 0183 GGA** (`$GPGGA`, `$GNGGA`, ...) - position, fix quality, HDOP
//! - **ForeFlight XGPS** - `XGPSname,lon,lat,alt_m,track,gs_m/s`, the format most
//!   phone GPS-forwarding apps emit
//!
//! A datagram may carry several newline-separated sentences.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::trace;

use super::PositionFix;
use crate::coord::Coordinate;

/// Approximate user-equivalent range error used to turn HDOP into meters.
const UERE_METERS: f64 = 5.0;

/// Parse every recognised sentence in a datagram.
///
/// `received_at` stamps sentences that carry no usable date.
pub fn parse_datagram(data: &[u8], received_at: DateTime<Utc>) -> Vec<PositionFix> {
    let Ok(text) = std::str::from_utf8(data) else {
        trace!(len = data.len(), "Non-UTF-8 datagram ignored");
        return Vec::new();
    };

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| parse_sentence(line, received_at))
        .collect()
}

/// Parse a single sentence.
fn parse_sentence(line: &str, received_at: DateTime<Utc>) -> Option<PositionFix> {
    if line.starts_with("XGPS") {
        return parse_xgps(line, received_at);
    }
    if line.starts_with('$') {
        let body = verify_checksum(line)?;
        let kind = body.get(2..5)?;
        return match kind {
            "RMC" => parse_rmc(body),
            "GGA" => parse_gga(body, received_at),
            _ => None,
        };
    }
    None
}

/// Strip `$` and `*hh`, checking the XOR checksum when present.
fn verify_checksum(line: &str) -> Option<&str> {
    let line = line.strip_prefix('$')?;
    match line.split_once('*') {
        Some((body, checksum)) => {
            let expected = u8::from_str_radix(checksum.trim(), 16).ok()?;
            let actual = body.bytes().fold(0u8, |acc, b| acc ^ b);
            if actual != expected {
                trace!(sentence = line, "NMEA checksum mismatch");
                return None;
            }
            Some(body)
        }
        None => Some(line),
    }
}

/// `GPRMC,hhmmss.ss,A,llll.ll,a,yyyyy.yy,a,speed,course,ddmmyy,...`
fn parse_rmc(body: &str) -> Option<PositionFix> {
    let fields: Vec<&str> = body.split(',').collect();
    if fields.len() < 10 {
        trace!("RMC sentence too short: {} fields", fields.len());
        return None;
    }
    // 'V' means the receiver has no valid fix
    if fields[2] != "A" {
        return None;
    }

    let latitude = parse_nmea_angle(fields[3], fields[4])?;
    let longitude = parse_nmea_angle(fields[5], fields[6])?;
    let time = parse_nmea_time(fields[1])?;
    let date = NaiveDate::parse_from_str(fields[9], "%d%m%y").ok()?;
    let timestamp = date.and_time(time).and_utc();

    Some(PositionFix::new(
        Coordinate::new(latitude, longitude).ok()?,
        timestamp,
    ))
}

/// `GPGGA,hhmmss.ss,llll.ll,a,yyyyy.yy,a,quality,sats,hdop,alt,...`
fn parse_gga(body: &str, received_at: DateTime<Utc>) -> Option<PositionFix> {
    let fields: Vec<&str> = body.split(',').collect();
    if fields.len() < 9 {
        trace!("GGA sentence too short: {} fields", fields.len());
        return None;
    }
    let quality: u8 = fields[6].parse().ok()?;
    if quality == 0 {
        return None;
    }

    let latitude = parse_nmea_angle(fields[2], fields[3])?;
    let longitude = parse_nmea_angle(fields[4], fields[5])?;
    let mut fix = PositionFix::new(Coordinate::new(latitude, longitude).ok()?, received_at);
    if let Ok(hdop) = fields[8].parse::<f64>() {
        fix.accuracy_meters = Some(hdop * UERE_METERS);
    }
    Some(fix)
}

/// `XGPSname,lon,lat,alt_m,track,gs_m/s`
fn parse_xgps(line: &str, received_at: DateTime<Utc>) -> Option<PositionFix> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 6 {
        trace!("XGPS sentence too short: {} parts", parts.len());
        return None;
    }
    let longitude: f64 = parts[1].trim().parse().ok()?;
    let latitude: f64 = parts[2].trim().parse().ok()?;
    Some(PositionFix::new(
        Coordinate::new(latitude, longitude).ok()?,
        received_at,
    ))
}

/// `ddmm.mmmm` / `dddmm.mmmm` plus hemisphere letter → signed degrees.
fn parse_nmea_angle(value: &str, hemisphere: &str) -> Option<f64> {
    let dot = value.find('.').unwrap_or(value.len());
    if dot < 3 {
        return None;
    }
    // `get` rather than indexing: a multibyte char must not panic the receive loop
    let degrees: f64 = value.get(..dot - 2)?.parse().ok()?;
    let minutes: f64 = value.get(dot - 2..)?.parse().ok()?;
    let magnitude = degrees + minutes / 60.0;
    match hemisphere {
        "N" | "E" => Some(magnitude),
        "S" | "W" => Some(-magnitude),
        _ => None,
    }
}

/// `hhmmss` or `hhmmss.sss`.
fn parse_nmea_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H%M%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H%M%S"))
        .ok()
}
