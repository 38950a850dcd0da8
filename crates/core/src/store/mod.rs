//! Patient record store.
//!
//! The record store owns durable storage of patients and medical notes. The ward service
//! only talks to it through [`RecordStore`], so adapters can be swapped without touching
//! lifecycle code:
//!
//! - [`FileRecordStore`] keeps JSON files in a sharded directory tree.
//! - [`InMemoryRecordStore`] keeps everything in process memory.

mod files;
mod memory;

pub use files::FileRecordStore;
pub use memory::InMemoryRecordStore;

use crate::config::{CoreConfig, StoreKind};
use crate::note::{notes_on, MedicalNote, NewNote};
use crate::patient::{NewPatient, Patient, PatientUpdate};
use crate::{RecordId, WardResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Request/response contract of the record store.
///
/// The store assigns identifiers on creation and returns the confirmed record from every
/// write. Notes are returned in insertion order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_patients(&self) -> WardResult<Vec<Patient>>;

    async fn create_patient(&self, patient: NewPatient) -> WardResult<Patient>;

    /// # Errors
    ///
    /// Returns [`crate::WardError::NotFound`] for an unknown id, or when a discharge targets a
    /// patient that is no longer `Active`.
    async fn update_patient(&self, id: RecordId, update: PatientUpdate) -> WardResult<Patient>;

    async fn add_note(&self, note: NewNote) -> WardResult<MedicalNote>;

    async fn list_notes(&self, patient_id: RecordId) -> WardResult<Vec<MedicalNote>>;

    async fn list_notes_by_date(
        &self,
        patient_id: RecordId,
        date: NaiveDate,
    ) -> WardResult<Vec<MedicalNote>> {
        let notes = self.list_notes(patient_id).await?;
        Ok(notes_on(notes, date))
    }
}

/// Opens the record store selected by `cfg`.
pub fn open_store(cfg: &CoreConfig) -> WardResult<Arc<dyn RecordStore>> {
    match cfg.store_kind() {
        StoreKind::File => {
            let store = FileRecordStore::open(cfg.patients_dir())?;
            Ok(Arc::new(store))
        }
        StoreKind::Memory => Ok(Arc::new(InMemoryRecordStore::new())),
    }
}
