//! # Ward Core
//!
//! Core business logic for the ward management system.
//!
//! This crate contains the patient lifecycle, the medical note ledger and the derived
//! reports:
//! - Admission, discharge and discharge-by-MRN requests ([`WardService`])
//! - Append-only medical notes per patient
//! - Daily specialty census ([`report::DailyReport`]) and per-day note extraction
//!   ([`extract`])
//! - Record store adapters behind the [`store::RecordStore`] trait
//!
//! **No API concerns**: HTTP/gRPC servers, authentication and wire types belong in
//! `api-rest`, `api-grpc` or `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod note;
pub mod patient;
pub mod report;
pub mod specialty;
pub mod store;
pub mod ward;

pub use config::{CoreConfig, StoreKind};
pub use constants::DEFAULT_PATIENT_DATA_DIR;
pub use error::{StoreError, WardError, WardResult};
pub use extract::PatientNotes;
pub use note::{MedicalNote, NewNote, NoteDraft};
pub use patient::{
    AdmissionForm, DetailsUpdate, Gender, NewPatient, Patient, PatientFilter, PatientStatus,
    PatientUpdate, StatusChange,
};
pub use report::{DailyReport, SpecialtyCensus};
pub use specialty::Specialty;
pub use store::{open_store, FileRecordStore, InMemoryRecordStore, RecordStore};
pub use ward::WardService;

pub use ward_types::{Age, FreeText, Mrn, NonEmptyText, TextError};
pub use ward_uuid::RecordId;
