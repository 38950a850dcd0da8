// Re-export the proto module from the shared `api-shared` crate so callers
// can reference `api_grpc::pb`.
pub use api_shared::pb;

use api_shared::auth;
use api_shared::convert::{self, extract_res, note_draft, parse_day, parse_patient_id};
use api_shared::pb::ward_server::Ward;
use api_shared::HealthService;
use std::sync::Arc;
use tonic::service::Interceptor;
use tonic::{Request, Response, Status};
use ward_core::{AdmissionForm, DetailsUpdate, WardError, WardService};

/// Checks the `x-api-key` metadata of every request against the configured key.
#[derive(Clone)]
pub struct ApiKeyInterceptor {
    expected: Arc<str>,
}

impl ApiKeyInterceptor {
    pub fn new(expected: impl Into<Arc<str>>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl Interceptor for ApiKeyInterceptor {
    fn call(&mut self, req: Request<()>) -> Result<Request<()>, Status> {
        let api_key = auth::api_key_from_metadata(req.metadata())?;
        auth::validate_api_key(api_key, &self.expected)?;
        Ok(req)
    }
}

/// Maps a ward error onto the closest gRPC status.
pub fn status_from(err: WardError) -> Status {
    match err {
        WardError::Validation(msg) => Status::invalid_argument(msg),
        WardError::NotFound(what) => Status::not_found(format!("{} not found", what)),
        e @ WardError::DuplicateMrn(_) => Status::already_exists(e.to_string()),
        e => {
            tracing::error!("ward request failed: {}", e);
            Status::internal("Internal error")
        }
    }
}

#[derive(Clone)]
pub struct WardGrpcService {
    ward: WardService,
}

impl WardGrpcService {
    pub fn new(ward: WardService) -> Self {
        Self { ward }
    }
}

#[tonic::async_trait]
impl Ward for WardGrpcService {
    async fn health(&self, _req: Request<()>) -> Result<Response<pb::HealthRes>, Status> {
        Ok(Response::new(HealthService::check_health()))
    }

    async fn list_patients(
        &self,
        req: Request<pb::ListPatientsReq>,
    ) -> Result<Response<pb::ListPatientsRes>, Status> {
        let filter = convert::patient_filter(req.get_ref()).map_err(status_from)?;
        let patients = self.ward.patients_matching(&filter).await;
        Ok(Response::new(pb::ListPatientsRes {
            patients: patients.iter().map(Into::into).collect(),
        }))
    }

    async fn get_patient(
        &self,
        req: Request<pb::GetPatientReq>,
    ) -> Result<Response<pb::PatientRes>, Status> {
        let id = parse_patient_id(&req.get_ref().id).map_err(status_from)?;
        let patient = self.ward.patient(id).await.map_err(status_from)?;
        Ok(Response::new(pb::PatientRes {
            patient: Some((&patient).into()),
        }))
    }

    async fn admit_patient(
        &self,
        req: Request<pb::AdmitPatientReq>,
    ) -> Result<Response<pb::PatientRes>, Status> {
        let form = AdmissionForm::from(req.into_inner());
        let patient = self.ward.admit(&form).await.map_err(status_from)?;
        Ok(Response::new(pb::PatientRes {
            patient: Some((&patient).into()),
        }))
    }

    async fn update_patient(
        &self,
        req: Request<pb::UpdatePatientReq>,
    ) -> Result<Response<pb::PatientRes>, Status> {
        let req = req.into_inner();
        let id = parse_patient_id(&req.id).map_err(status_from)?;
        let details = DetailsUpdate::from(req);
        let patient = self
            .ward
            .update_details(id, &details)
            .await
            .map_err(status_from)?;
        Ok(Response::new(pb::PatientRes {
            patient: Some((&patient).into()),
        }))
    }

    async fn discharge_patient(
        &self,
        req: Request<pb::DischargePatientReq>,
    ) -> Result<Response<pb::PatientRes>, Status> {
        let req = req.into_inner();
        let id = parse_patient_id(&req.id).map_err(status_from)?;
        let patient = self
            .ward
            .discharge(id, &req.notes)
            .await
            .map_err(status_from)?;
        Ok(Response::new(pb::PatientRes {
            patient: Some((&patient).into()),
        }))
    }

    async fn request_discharge(
        &self,
        req: Request<pb::RequestDischargeReq>,
    ) -> Result<Response<pb::RequestDischargeRes>, Status> {
        let discharged = self
            .ward
            .request_discharge(&req.get_ref().mrn)
            .await
            .map_err(status_from)?;
        Ok(Response::new(pb::RequestDischargeRes {
            discharged: discharged.is_some(),
            patient: discharged.as_ref().map(Into::into),
        }))
    }

    async fn add_note(
        &self,
        req: Request<pb::AddNoteReq>,
    ) -> Result<Response<pb::MedicalNote>, Status> {
        let draft = note_draft(req.into_inner()).map_err(status_from)?;
        let patient_id = draft.patient_id;
        match self.ward.add_note(draft).await {
            Ok(note) => Ok(Response::new((&note).into())),
            Err(e) => {
                tracing::warn!("note for patient {} was not recorded: {}", patient_id, e);
                Err(status_from(e))
            }
        }
    }

    async fn list_notes(
        &self,
        req: Request<pb::ListNotesReq>,
    ) -> Result<Response<pb::ListNotesRes>, Status> {
        let req = req.into_inner();
        let id = parse_patient_id(&req.patient_id).map_err(status_from)?;
        let notes = match req.date.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(day) => {
                let day = parse_day(day).map_err(status_from)?;
                self.ward.list_notes_by_date(id, day).await
            }
            None => self.ward.list_notes(id).await,
        }
        .map_err(status_from)?;

        Ok(Response::new(pb::ListNotesRes {
            notes: notes.iter().map(Into::into).collect(),
        }))
    }

    async fn daily_report(&self, _req: Request<()>) -> Result<Response<pb::DailyReportRes>, Status> {
        let report = self.ward.daily_report().await;
        Ok(Response::new((&report).into()))
    }

    async fn extract_notes(
        &self,
        req: Request<pb::ExtractNotesReq>,
    ) -> Result<Response<pb::ExtractNotesRes>, Status> {
        let day = parse_day(&req.get_ref().date).map_err(status_from)?;
        let rows = self.ward.extract(day).await.map_err(status_from)?;
        Ok(Response::new(extract_res(day, &rows)))
    }
}
