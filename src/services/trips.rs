use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::{
    departure::parse_local_departure,
    error::AppError,
    models::trip::{NewTrip, Trip, TripId},
    services::{board::Board, kv::KeyValueStore},
};

/// Storage key of the trip collection.
pub const TRIPS_KEY: &str = "viagens";

/// The trip collection, kept as a single JSON array under [`TRIPS_KEY`] and
/// sorted by departure.
#[derive(Clone)]
pub struct TripStore {
    kv: Arc<dyn KeyValueStore>,
    offset: FixedOffset,
    write_lock: Arc<Mutex<()>>,
}

impl TripStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, offset: FixedOffset) -> Self {
        Self {
            kv,
            offset,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub async fn load(&self) -> Result<Vec<Trip>, AppError> {
        let Some(raw) = self.kv.get(TRIPS_KEY).await? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|err| {
            error!("stored trips under {TRIPS_KEY:?} are not valid json: {err}");
            AppError::CorruptStore(err.to_string())
        })
    }

    pub async fn save(&self, trips: &[Trip]) -> Result<(), AppError> {
        let data = serde_json::to_string(trips)?;
        self.kv.set(TRIPS_KEY, &data).await
    }

    pub async fn add(&self, new: NewTrip) -> Result<Trip, AppError> {
        self.add_at(new, Utc::now()).await
    }

    /// Like [`TripStore::add`], with the id derived from `now`.
    pub async fn add_at(&self, new: NewTrip, now: DateTime<Utc>) -> Result<Trip, AppError> {
        // Only trips with a readable departure can be ordered.
        let departure = parse_local_departure(&new.data, &new.hora, self.offset)?;

        let _guard = self.write_lock.lock().await;
        let mut trips = self.load().await?;
        let id = next_id(&trips, now);
        let trip = Trip::from_new(id, new);
        trips.push(trip.clone());
        sort_by_departure(&mut trips, self.offset);
        self.save(&trips).await?;

        info!(
            "added trip {id} {} -> {} departing {departure}",
            trip.origem, trip.destino
        );
        Ok(trip)
    }

    /// Returns whether a trip was removed.
    pub async fn remove(&self, id: TripId) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut trips = self.load().await?;
        let before = trips.len();
        trips.retain(|trip| trip.id != id);
        if trips.len() == before {
            debug!("remove: no trip with id {id}");
            return Ok(false);
        }
        self.save(&trips).await?;

        info!("removed trip {id}");
        Ok(true)
    }

    pub async fn update_passenger_count(
        &self,
        id: TripId,
        passengers: String,
    ) -> Result<Option<Trip>, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut trips = self.load().await?;
        let Some(trip) = trips.iter_mut().find(|trip| trip.id == id) else {
            return Ok(None);
        };
        trip.passageiros = passengers.trim().to_string();
        let updated = trip.clone();
        self.save(&trips).await?;

        debug!("trip {id} passengers set to {:?}", updated.passageiros);
        Ok(Some(updated))
    }

    /// Drops the stored collection without reading it, so an unreadable blob
    /// can always be discarded.
    pub async fn clear_all(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(TRIPS_KEY).await?;
        info!("cleared all trips");
        Ok(())
    }

    pub async fn board(&self, now: DateTime<Utc>) -> Result<Board, AppError> {
        let trips = self.load().await?;
        Ok(Board::build(&trips, now, self.offset))
    }
}

fn next_id(trips: &[Trip], now: DateTime<Utc>) -> TripId {
    let candidate = now.timestamp_millis();
    match trips.iter().map(|trip| trip.id).max() {
        Some(max) if max >= candidate => max + 1,
        _ => candidate,
    }
}

/// Stable, so equal departures keep insertion order. Unreadable departures
/// sink to the end.
fn sort_by_departure(trips: &mut [Trip], offset: FixedOffset) {
    trips.sort_by_cached_key(|trip| {
        trip.departure(offset)
            .map(|departure| departure.timestamp_millis())
            .unwrap_or(i64::MAX)
    });
}
