use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::{departure::parse_local_departure, error::AppError};

pub type TripId = i64;

/// Field names match the persisted blob. Platform and passenger count are
/// kept as the text typed into the form; older browser builds wrote them as
/// strings, and whatever a number input accepted ("-1", "2.5") must load.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: TripId,
    pub origem: String,
    pub destino: String,
    pub data: String,
    pub hora: String,
    #[serde(deserialize_with = "number_or_text")]
    pub plataforma: String,
    /// Empty when no count was given.
    #[serde(default, deserialize_with = "number_or_text")]
    pub passageiros: String,
}

impl Trip {
    pub fn from_new(id: TripId, new: NewTrip) -> Self {
        Self {
            id,
            origem: new.origem,
            destino: new.destino,
            data: new.data,
            hora: new.hora,
            plataforma: new.plataforma,
            passageiros: new.passageiros,
        }
    }

    pub fn departure(&self, offset: FixedOffset) -> Result<DateTime<FixedOffset>, AppError> {
        parse_local_departure(&self.data, &self.hora, offset)
    }
}

/// A trip as submitted, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrip {
    pub origem: String,
    pub destino: String,
    pub data: String,
    pub hora: String,
    pub plataforma: String,
    pub passageiros: String,
}

fn number_or_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => String::new(),
        Some(Raw::Text(text)) => text.trim().to_string(),
        Some(Raw::Number(number)) => number.to_string(),
    })
}
