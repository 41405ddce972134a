use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{FixedOffset, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::AppConfig,
    departure::{parse_local_departure, today_in},
    error::AppError,
    models::trip::{NewTrip, TripId},
    services::board::{Board, TripCard},
    state::AppState,
};

const TRIPS_PATH: &str = "/viagens";
const CLEAR_CONFIRMATION: &str = "sim";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(TRIPS_PATH, get(trips_page).post(create_trip))
        .route("/viagens/:id/excluir", post(delete_trip))
        .route("/viagens/:id/passageiros", post(update_passengers))
        .route("/viagens/limpar", post(clear_trips))
        .route("/api/viagens", get(board_json))
}

/// Raw creation form. Every field arrives as text so missing values can be
/// reported instead of rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripForm {
    #[serde(default)]
    pub origem: String,
    #[serde(default)]
    pub destino: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub hora: String,
    #[serde(default)]
    pub plataforma: String,
    #[serde(default)]
    pub passageiros: String,
}

impl TripForm {
    pub fn blank(config: &AppConfig) -> Self {
        Self {
            origem: config.default_origin.clone(),
            data: today_in(config.utc_offset, Utc::now()),
            ..Self::default()
        }
    }

    pub fn validate(&self, offset: FixedOffset) -> Result<NewTrip, AppError> {
        let origem = required(&self.origem, "origem")?;
        let destino = required(&self.destino, "destino")?;
        let data = required(&self.data, "data")?;
        let hora = required(&self.hora, "hora")?;
        let plataforma = required(&self.plataforma, "plataforma")?;
        let passageiros = self.passageiros.trim().to_string();
        parse_local_departure(&data, &hora, offset)
            .map_err(|_| AppError::BadRequest("Data ou hora inválida.".into()))?;

        Ok(NewTrip {
            origem,
            destino,
            data,
            hora,
            plataforma,
            passageiros,
        })
    }
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("Preencha o campo {field}.")));
    }
    Ok(trimmed.to_string())
}

#[derive(Template)]
#[template(path = "trips.html")]
struct TripsTemplate {
    clock: String,
    refresh_ms: u128,
    form: TripForm,
    show_error: bool,
    error_message: String,
    active: Vec<TripCard>,
    past: Vec<TripCard>,
}

async fn trips_page(State(state): State<AppState>) -> Result<Response, AppError> {
    let form = TripForm::blank(&state.config);
    render_trips_page(&state, form, None).await
}

async fn render_trips_page(
    state: &AppState,
    form: TripForm,
    error: Option<String>,
) -> Result<Response, AppError> {
    let board = state.trips.board(Utc::now()).await?;
    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    let page = TripsTemplate {
        clock: board.clock,
        refresh_ms: state.config.refresh_ms(),
        form,
        show_error: error.is_some(),
        error_message: error.unwrap_or_default(),
        active: board.active,
        past: board.past,
    };
    Ok((status, AskamaTemplateResponse::into_response(page)).into_response())
}

async fn create_trip(
    State(state): State<AppState>,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let new = match form.validate(state.trips.offset()) {
        Ok(new) => new,
        Err(AppError::BadRequest(msg)) => {
            debug!("rejected trip form: {msg}");
            return render_trips_page(&state, form, Some(msg)).await;
        }
        Err(err) => return Err(err),
    };
    state.trips.add(new).await?;
    Ok(Redirect::to(TRIPS_PATH).into_response())
}

async fn delete_trip(
    State(state): State<AppState>,
    Path(id): Path<TripId>,
) -> Result<Redirect, AppError> {
    state.trips.remove(id).await?;
    Ok(Redirect::to(TRIPS_PATH))
}

/// An empty value clears the count.
#[derive(Deserialize)]
struct PassengerForm {
    #[serde(default)]
    passageiros: String,
}

async fn update_passengers(
    State(state): State<AppState>,
    Path(id): Path<TripId>,
    Form(form): Form<PassengerForm>,
) -> Result<Redirect, AppError> {
    state
        .trips
        .update_passenger_count(id, form.passageiros)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Redirect::to(TRIPS_PATH))
}

#[derive(Deserialize)]
struct ClearForm {
    #[serde(default)]
    confirm: String,
}

async fn clear_trips(
    State(state): State<AppState>,
    Form(form): Form<ClearForm>,
) -> Result<Redirect, AppError> {
    if form.confirm.trim() != CLEAR_CONFIRMATION {
        return Err(AppError::BadRequest(
            "Confirme para apagar todas as viagens.".into(),
        ));
    }
    state.trips.clear_all().await?;
    Ok(Redirect::to(TRIPS_PATH))
}

async fn board_json(State(state): State<AppState>) -> Result<Json<Board>, AppError> {
    Ok(Json(state.trips.board(Utc::now()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departure::default_offset;

    fn filled() -> TripForm {
        TripForm {
            origem: " São Paulo ".into(),
            destino: "Santos".into(),
            data: "2024-05-10".into(),
            hora: "07:45".into(),
            plataforma: "12".into(),
            passageiros: "".into(),
        }
    }

    #[test]
    fn valid_form_becomes_a_trip() {
        let new = filled().validate(default_offset()).unwrap();
        assert_eq!(new.origem, "São Paulo");
        assert_eq!(new.plataforma, "12");
        assert!(new.passageiros.is_empty());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let mut form = filled();
        form.destino = "   ".into();
        match form.validate(default_offset()) {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("destino")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn number_fields_are_kept_as_typed() {
        let mut form = filled();
        form.plataforma = "-1".into();
        form.passageiros = " 2 ".into();
        let new = form.validate(default_offset()).unwrap();
        assert_eq!(new.plataforma, "-1");
        assert_eq!(new.passageiros, "2");
    }

    #[test]
    fn unreadable_times_are_rejected() {
        let mut form = filled();
        form.hora = "7h45".into();
        assert!(form.validate(default_offset()).is_err());
    }
}
