use crate::error::ApiError;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Whether an optional coordinate pair lies within `radius_km` of the origin.
/// Rows without both coordinates never match.
pub fn within(origin: (f64, f64), lat: Option<f64>, lon: Option<f64>, radius_km: f64) -> bool {
    match (lat, lon) {
        (Some(lat), Some(lon)) => haversine_km(origin.0, origin.1, lat, lon) <= radius_km,
        _ => false,
    }
}

pub fn validate_point(lat: f64, lon: f64) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::bad_request("Coordinates out of range"));
    }
    Ok(())
}

pub fn validate_radius(radius_km: f64) -> Result<(), ApiError> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(ApiError::bad_request("radius_km must be a non-negative number"));
    }
    Ok(())
}
