//! Per-assignment daily state, derived fresh on every read.

use chrono::NaiveTime;
use serde::Serialize;
use utoipa::ToSchema;

use super::window::ConfirmationWindow;

/// Daily state of an assignment. Never stored; recomputed from the
/// schedule and today's confirmation row on each query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DailyState {
    Pendiente,
    DisponibleConfirmacion,
    Confirmado,
    ConfirmadoFueraRango,
    Perdido,
}

/// Derive the state for an assignment scheduled today.
///
/// `confirmed_within_geofence` is the `within_geofence` value of today's
/// confirmation row, if one exists. A confirmation row is terminal for the
/// day regardless of the current time.
pub fn derive_state(
    confirmed_within_geofence: Option<bool>,
    window: &ConfirmationWindow,
    now: NaiveTime,
) -> DailyState {
    match confirmed_within_geofence {
        Some(true) => DailyState::Confirmado,
        Some(false) => DailyState::ConfirmadoFueraRango,
        None if window.can_confirm_now(now) => DailyState::DisponibleConfirmacion,
        None if window.is_expired(now) => DailyState::Perdido,
        None => DailyState::Pendiente,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn open_window_without_confirmation_is_available() {
        let w = ConfirmationWindow::around(t(9, 0));
        assert_eq!(
            derive_state(None, &w, t(9, 2)),
            DailyState::DisponibleConfirmacion
        );
    }

    #[test]
    fn expired_window_without_confirmation_is_missed() {
        let w = ConfirmationWindow::around(t(9, 0));
        assert_eq!(derive_state(None, &w, t(9, 10)), DailyState::Perdido);
    }

    #[test]
    fn before_the_window_is_pending() {
        let w = ConfirmationWindow::around(t(9, 0));
        assert_eq!(derive_state(None, &w, t(7, 30)), DailyState::Pendiente);
    }

    #[test]
    fn confirmation_is_terminal_regardless_of_query_time() {
        let w = ConfirmationWindow::around(t(9, 0));
        for now in [t(8, 0), t(9, 2), t(18, 45)] {
            assert_eq!(derive_state(Some(true), &w, now), DailyState::Confirmado);
            assert_eq!(
                derive_state(Some(false), &w, now),
                DailyState::ConfirmadoFueraRango
            );
        }
    }

    #[test]
    fn serializes_to_wire_names() {
        let json = serde_json::to_string(&DailyState::DisponibleConfirmacion).unwrap();
        assert_eq!(json, "\"disponible_confirmacion\"");
        let json = serde_json::to_string(&DailyState::ConfirmadoFueraRango).unwrap();
        assert_eq!(json, "\"confirmado_fuera_rango\"");
    }
}
