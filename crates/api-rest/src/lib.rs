//! # API REST
//!
//! REST API implementation for the ward.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CSV download, CORS)
//!
//! Uses `api-shared` for wire types and conversions.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::convert::{extract_res, note_draft, parse_day, parse_patient_id, patient_filter};
use api_shared::{pb, HealthService};
use ward_core::{AdmissionForm, DetailsUpdate, WardError, WardService};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub ward: WardService,
}

/// Error returned by handlers: a ward error rendered as a status code and message.
#[derive(Debug)]
pub struct ApiError(WardError);

impl From<WardError> for ApiError {
    fn from(err: WardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WardError::Validation(_) => StatusCode::BAD_REQUEST,
            WardError::NotFound(_) => StatusCode::NOT_FOUND,
            WardError::DuplicateMrn(_) => StatusCode::CONFLICT,
            WardError::Store(_) | WardError::InvalidConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("ward request failed: {}", self.0);
            return (status, "Internal error").into_response();
        }
        (status, self.0.to_string()).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotesQuery {
    pub date: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        admit_patient,
        get_patient,
        update_patient,
        discharge_patient,
        request_discharge,
        list_notes,
        add_note,
        daily_report,
        extract_notes,
        extract_csv,
    ),
    components(schemas(
        pb::HealthRes,
        pb::Patient,
        pb::ListPatientsRes,
        pb::PatientRes,
        pb::AdmitPatientReq,
        pb::UpdatePatientReq,
        pb::DischargePatientReq,
        pb::RequestDischargeReq,
        pb::RequestDischargeRes,
        pb::MedicalNote,
        pb::AddNoteReq,
        pb::ListNotesRes,
        pb::SpecialtyCensus,
        pb::DailyReportRes,
        pb::PatientNotes,
        pb::ExtractNotesRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router, including Swagger UI, over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(admit_patient))
        .route("/patients/:id", get(get_patient).patch(update_patient))
        .route("/patients/:id/discharge", post(discharge_patient))
        .route("/patients/:id/notes", get(list_notes).post(add_note))
        .route("/discharge-requests", post(request_discharge))
        .route("/reports/daily", get(daily_report))
        .route("/extract", get(extract_notes))
        .route("/extract/csv", get(extract_csv))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = pb::HealthRes)
    )
)]
async fn health() -> Json<pb::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/patients",
    params(
        ("specialty" = Option<String>, Query, description = "Only patients of this specialty"),
        ("status" = Option<String>, Query, description = "Active or Discharged"),
        ("mrn" = Option<String>, Query, description = "Exact medical record number"),
    ),
    responses(
        (status = 200, description = "Matching patients", body = pb::ListPatientsRes),
        (status = 400, description = "Unknown specialty or status")
    )
)]
async fn list_patients(
    State(state): State<AppState>,
    Query(query): Query<pb::ListPatientsReq>,
) -> ApiResult<Json<pb::ListPatientsRes>> {
    let filter = patient_filter(&query)?;
    let patients = state.ward.patients_matching(&filter).await;
    Ok(Json(pb::ListPatientsRes {
        patients: patients.iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = pb::AdmitPatientReq,
    responses(
        (status = 201, description = "Patient admitted", body = pb::PatientRes),
        (status = 400, description = "Invalid admission form"),
        (status = 409, description = "An active patient already holds the MRN"),
        (status = 500, description = "Internal server error")
    )
)]
async fn admit_patient(
    State(state): State<AppState>,
    Json(req): Json<pb::AdmitPatientReq>,
) -> ApiResult<(StatusCode, Json<pb::PatientRes>)> {
    let patient = state.ward.admit(&AdmissionForm::from(req)).await?;
    Ok((
        StatusCode::CREATED,
        Json(pb::PatientRes {
            patient: Some((&patient).into()),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient details", body = pb::PatientRes),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<pb::PatientRes>> {
    let patient = state.ward.patient(parse_patient_id(&id)?).await?;
    Ok(Json(pb::PatientRes {
        patient: Some((&patient).into()),
    }))
}

#[utoipa::path(
    patch,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = pb::UpdatePatientReq,
    responses(
        (status = 200, description = "Patient updated", body = pb::PatientRes),
        (status = 400, description = "Nothing to update or malformed id"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(mut req): Json<pb::UpdatePatientReq>,
) -> ApiResult<Json<pb::PatientRes>> {
    req.id = id;
    let id = parse_patient_id(&req.id)?;
    let patient = state
        .ward
        .update_details(id, &DetailsUpdate::from(req))
        .await?;
    Ok(Json(pb::PatientRes {
        patient: Some((&patient).into()),
    }))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/discharge",
    params(("id" = String, Path, description = "Patient id")),
    request_body = pb::DischargePatientReq,
    responses(
        (status = 200, description = "Patient discharged", body = pb::PatientRes),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "No active patient with this id"),
        (status = 500, description = "Internal server error")
    )
)]
async fn discharge_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(mut req): Json<pb::DischargePatientReq>,
) -> ApiResult<Json<pb::PatientRes>> {
    req.id = id;
    let id = parse_patient_id(&req.id)?;
    let patient = state.ward.discharge(id, &req.notes).await?;
    Ok(Json(pb::PatientRes {
        patient: Some((&patient).into()),
    }))
}

#[utoipa::path(
    post,
    path = "/discharge-requests",
    request_body = pb::RequestDischargeReq,
    responses(
        (status = 200, description = "Discharge outcome; `discharged` is false for an unknown MRN", body = pb::RequestDischargeRes),
        (status = 500, description = "Internal server error")
    )
)]
async fn request_discharge(
    State(state): State<AppState>,
    Json(req): Json<pb::RequestDischargeReq>,
) -> ApiResult<Json<pb::RequestDischargeRes>> {
    let discharged = state.ward.request_discharge(&req.mrn).await?;
    Ok(Json(pb::RequestDischargeRes {
        discharged: discharged.is_some(),
        patient: discharged.as_ref().map(Into::into),
    }))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/notes",
    params(
        ("id" = String, Path, description = "Patient id"),
        ("date" = Option<String>, Query, description = "Only notes written on this day (YYYY-MM-DD)"),
    ),
    responses(
        (status = 200, description = "Notes in insertion order", body = pb::ListNotesRes),
        (status = 400, description = "Malformed id or date"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn list_notes(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(query): Query<NotesQuery>,
) -> ApiResult<Json<pb::ListNotesRes>> {
    let id = parse_patient_id(&id)?;
    let notes = match query.date.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(day) => state.ward.list_notes_by_date(id, parse_day(day)?).await?,
        None => state.ward.list_notes(id).await?,
    };
    Ok(Json(pb::ListNotesRes {
        notes: notes.iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/notes",
    params(("id" = String, Path, description = "Patient id")),
    request_body = pb::AddNoteReq,
    responses(
        (status = 201, description = "Note recorded", body = pb::MedicalNote),
        (status = 400, description = "Blank note or malformed date"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn add_note(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(mut req): Json<pb::AddNoteReq>,
) -> ApiResult<(StatusCode, Json<pb::MedicalNote>)> {
    req.patient_id = id;
    let draft = note_draft(req)?;
    let patient_id = draft.patient_id;
    match state.ward.add_note(draft).await {
        Ok(note) => Ok((StatusCode::CREATED, Json((&note).into()))),
        Err(e) => {
            tracing::warn!("note for patient {} was not recorded: {}", patient_id, e);
            Err(e.into())
        }
    }
}

#[utoipa::path(
    get,
    path = "/reports/daily",
    responses(
        (status = 200, description = "Census of every specialty", body = pb::DailyReportRes)
    )
)]
async fn daily_report(State(state): State<AppState>) -> Json<pb::DailyReportRes> {
    let report = state.ward.daily_report().await;
    Json((&report).into())
}

#[utoipa::path(
    get,
    path = "/extract",
    params(("date" = String, Query, description = "Day to extract (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "Patients with notes on the day", body = pb::ExtractNotesRes),
        (status = 400, description = "Malformed date"),
        (status = 500, description = "A note lookup failed")
    )
)]
async fn extract_notes(
    State(state): State<AppState>,
    Query(query): Query<pb::ExtractNotesReq>,
) -> ApiResult<Json<pb::ExtractNotesRes>> {
    let day = parse_day(&query.date)?;
    let rows = state.ward.extract(day).await?;
    Ok(Json(extract_res(day, &rows)))
}

#[utoipa::path(
    get,
    path = "/extract/csv",
    params(("date" = String, Query, description = "Day to extract (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "CSV attachment named patient_data_<date>.csv", body = String, content_type = "text/csv"),
        (status = 400, description = "Malformed date"),
        (status = 500, description = "A note lookup failed")
    )
)]
async fn extract_csv(
    State(state): State<AppState>,
    Query(query): Query<pb::ExtractNotesReq>,
) -> ApiResult<Response> {
    let day = parse_day(&query.date)?;
    let rows = state.ward.extract(day).await?;
    let res = extract_res(day, &rows);

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", res.csv_filename),
        ),
    ];
    Ok((headers, res.csv).into_response())
}
