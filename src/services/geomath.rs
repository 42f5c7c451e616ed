// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geodesic distance, pace/speed conversions and route encoding.

use crate::models::GpsPoint;
use geo::{Coord, LineString};
use geojson::{Feature, Geometry, Value};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in metres between two lat/lon pairs (degrees).
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Speed in km/h for a distance covered in `seconds`. Zero for non-positive time.
pub fn speed_kmh(distance_m: f64, seconds: f64) -> f64 {
    if seconds <= 0.0 {
        return 0.0;
    }
    distance_m / seconds * 3.6
}

/// Pace in min/km for a speed in km/h. Zero (not infinity) when standing still.
pub fn pace_from_speed(speed_kmh: f64) -> f64 {
    if speed_kmh > 0.0 {
        60.0 / speed_kmh
    } else {
        0.0
    }
}

/// Pace in min/km for a distance covered in `seconds`.
pub fn pace_min_per_km(distance_m: f64, seconds: f64) -> f64 {
    if distance_m <= 0.0 {
        return 0.0;
    }
    (seconds / 60.0) / (distance_m / 1000.0)
}

/// Format a min/km pace as `m:ss`.
pub fn format_pace(pace: f64) -> String {
    if !pace.is_finite() || pace <= 0.0 {
        return "0:00".to_string();
    }
    let total_secs = (pace * 60.0).round() as u64;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Subsample a route so it keeps roughly `max_points` points.
///
/// Every Nth point is kept, plus the final point so the route ends where the
/// workout ended.
pub fn compress_route(points: &[GpsPoint], max_points: usize) -> LineString<f64> {
    let to_coord = |p: &GpsPoint| Coord {
        x: p.longitude,
        y: p.latitude,
    };

    if max_points == 0 || points.len() <= max_points {
        return points.iter().map(to_coord).collect::<Vec<_>>().into();
    }

    let step = points.len().div_ceil(max_points);
    let mut coords: Vec<Coord<f64>> = points.iter().step_by(step).map(to_coord).collect();
    if (points.len() - 1) % step != 0 {
        if let Some(last) = points.last() {
            coords.push(to_coord(last));
        }
    }
    coords.into()
}

/// Encode a route as `lat,lon;lat,lon` with six decimals.
pub fn encode_route(line: &LineString<f64>) -> String {
    line.coords()
        .map(|c| format!("{:.6},{:.6}", c.y, c.x))
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse a `lat,lon;lat,lon` route string.
pub fn decode_route(encoded: &str) -> Option<LineString<f64>> {
    if encoded.is_empty() {
        return Some(LineString::new(vec![]));
    }
    encoded
        .split(';')
        .map(|pair| {
            let (lat, lon) = pair.split_once(',')?;
            Some(Coord {
                x: lon.trim().parse().ok()?,
                y: lat.trim().parse().ok()?,
            })
        })
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}

/// Encode a route as a Google polyline (precision 5).
pub fn encode_polyline(line: &LineString<f64>) -> Result<String, String> {
    polyline::encode_coordinates(line.coords().copied(), 5).map_err(|e| e.to_string())
}

/// Route as a GeoJSON LineString feature.
pub fn route_geojson(line: &LineString<f64>, session_id: &str) -> Feature {
    let coordinates = line.coords().map(|c| vec![c.x, c.y]).collect();
    let mut properties = serde_json::Map::new();
    properties.insert(
        "sessionId".to_string(),
        serde_json::Value::String(session_id.to_string()),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coordinates))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
