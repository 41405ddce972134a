use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::warn;

use crate::{
    departure::{format_clock, format_departure, millis_until, Countdown, Severity},
    models::trip::{Trip, TripId},
};

/// Everything a trip card shows, computed for one instant.
#[derive(Debug, Clone, Serialize)]
pub struct TripCard {
    pub id: TripId,
    pub origin: String,
    pub destination: String,
    pub platform: String,
    pub passengers: String,
    pub departure: String,
    pub countdown: String,
    pub countdown_prefix: String,
    pub countdown_rest: String,
    pub severity: Severity,
    pub card_class: &'static str,
    pub text_class: &'static str,
}

impl TripCard {
    fn new(trip: &Trip, departure: &DateTime<FixedOffset>, diff_ms: i64) -> Self {
        let countdown = Countdown::from_millis(diff_ms);
        let severity = Severity::from_millis(diff_ms);
        Self {
            id: trip.id,
            origin: trip.origem.clone(),
            destination: trip.destino.clone(),
            platform: trip.plataforma.clone(),
            passengers: trip.passageiros.clone(),
            departure: format_departure(departure),
            countdown: countdown.to_string(),
            countdown_prefix: countdown.prefix().to_string(),
            countdown_rest: countdown.rest(),
            severity,
            card_class: severity.card_class(),
            text_class: severity.text_class(),
        }
    }
}

/// Trips split around `now`: strictly later departures are active, the rest
/// are past. Both lists keep the store order.
#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub clock: String,
    pub active: Vec<TripCard>,
    pub past: Vec<TripCard>,
}

impl Board {
    pub fn build(trips: &[Trip], now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let mut active = Vec::new();
        let mut past = Vec::new();

        for trip in trips {
            let departure = match trip.departure(offset) {
                Ok(departure) => departure,
                Err(err) => {
                    warn!("skipping trip {} on the board: {err}", trip.id);
                    continue;
                }
            };
            let diff_ms = millis_until(&departure, now);
            let card = TripCard::new(trip, &departure, diff_ms);
            if diff_ms > 0 {
                active.push(card);
            } else {
                past.push(card);
            }
        }

        Self {
            clock: format_clock(now, offset),
            active,
            past,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departure::default_offset;

    fn ids(cards: &[TripCard]) -> Vec<TripId> {
        cards.iter().map(|card| card.id).collect()
    }

    fn trip(id: TripId, data: &str, hora: &str) -> Trip {
        Trip {
            id,
            origem: "São Paulo".into(),
            destino: format!("Destino {id}"),
            data: data.into(),
            hora: hora.into(),
            plataforma: "1".into(),
            passageiros: String::new(),
        }
    }

    #[test]
    fn exact_departure_instant_counts_as_past() {
        // 10:00 at -03:00
        let now: DateTime<Utc> = "2024-01-01T13:00:00Z".parse().unwrap();
        let trips = vec![
            trip(1, "2024-01-01", "09:59"),
            trip(2, "2024-01-01", "10:00"),
            trip(3, "2024-01-01", "10:01"),
        ];
        let board = Board::build(&trips, now, default_offset());
        assert_eq!(ids(&board.past), vec![1, 2]);
        assert_eq!(ids(&board.active), vec![3]);
        assert_eq!(board.active[0].severity, Severity::Critical);
        assert_eq!(board.active[0].countdown, "Faltam 1m 0s");
        assert_eq!(board.past[1].countdown_prefix, "Já passou");
        assert_eq!(board.past[0].card_class, Severity::Past.card_class());
        assert_eq!(board.clock, "01/01/2024 - 10:00:00");
    }

    #[test]
    fn unparsable_trips_are_left_out() {
        let now: DateTime<Utc> = "2024-01-01T13:00:00Z".parse().unwrap();
        let trips = vec![trip(1, "not-a-date", "10:00"), trip(2, "2024-01-02", "08:00")];
        let board = Board::build(&trips, now, default_offset());
        assert!(board.past.is_empty());
        assert_eq!(ids(&board.active), vec![2]);
        assert_eq!(board.active[0].departure, "02/01/2024, 08:00");
    }
}
