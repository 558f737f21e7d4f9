//! Eligibility and geofence checks for a confirmation attempt.
//!
//! The database work around these checks (assignment lookup, duplicate
//! pre-check, insert) lives in the HTTP handler; everything decidable
//! without I/O is here so it can be tested directly.

use chrono::NaiveTime;

use super::geo;
use super::window::ConfirmationWindow;

/// Outcome of testing a submitted position against a location's geofence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceCheck {
    pub distance_meters: f64,
    pub within_geofence: bool,
}

/// A submission exactly on the radius counts as inside (`<=`, not `<`).
pub fn check_geofence(
    location_lat: f64,
    location_lon: f64,
    submitted_lat: f64,
    submitted_lon: f64,
    radius_meters: f64,
) -> GeofenceCheck {
    let distance_meters = geo::distance_meters(location_lat, location_lon, submitted_lat, submitted_lon);
    GeofenceCheck {
        distance_meters,
        within_geofence: distance_meters <= radius_meters,
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    /// A confirmation already exists for (assignment, today). Idempotent
    /// rejection, never an overwrite.
    AlreadyConfirmed,
    /// Outside the permitted window; carries the window for user feedback.
    OutOfWindow(ConfirmationWindow),
}

/// Gate a confirmation attempt after the assignment lookup and before
/// anything is written. Being out of the geofence is not a rejection:
/// out-of-range attempts are recorded, not refused.
pub fn authorize(
    already_confirmed: bool,
    start_time: NaiveTime,
    now: NaiveTime,
) -> Result<ConfirmationWindow, Rejection> {
    if already_confirmed {
        return Err(Rejection::AlreadyConfirmed);
    }
    let window = ConfirmationWindow::around(start_time);
    if !window.can_confirm_now(now) {
        return Err(Rejection::OutOfWindow(window));
    }
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn duplicate_is_rejected_regardless_of_time() {
        for now in [t(8, 55), t(9, 2), t(14, 0)] {
            assert_eq!(
                authorize(true, t(9, 0), now),
                Err(Rejection::AlreadyConfirmed)
            );
        }
    }

    #[test]
    fn outside_the_window_carries_the_window_back() {
        let err = authorize(false, t(9, 0), t(10, 0)).unwrap_err();
        match err {
            Rejection::OutOfWindow(w) => {
                assert_eq!(w.opens(), "08:55");
                assert_eq!(w.closes(), "09:05");
            }
            other => panic!("unexpected rejection: {other:?}"),
        }
    }

    #[test]
    fn inside_the_window_is_authorized() {
        assert!(authorize(false, t(9, 0), t(9, 5)).is_ok());
        assert!(authorize(false, t(9, 0), t(8, 55)).is_ok());
    }

    #[test]
    fn geofence_boundary_is_inclusive() {
        // ~111.19m per thousandth of a degree of latitude.
        let check = check_geofence(0.0, 0.0, 0.001, 0.0, 200.0);
        assert!(check.within_geofence);

        let exact = check_geofence(0.0, 0.0, 0.001, 0.0, check.distance_meters);
        assert!(exact.within_geofence, "distance == radius must be inside");

        let outside = check_geofence(0.0, 0.0, 0.001, 0.0, check.distance_meters - 0.01);
        assert!(!outside.within_geofence);
    }
}
