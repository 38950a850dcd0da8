use super::RecordStore;
use crate::note::{MedicalNote, NewNote};
use crate::patient::{NewPatient, Patient, PatientUpdate};
use crate::{RecordId, StoreError, WardError, WardResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Records {
    patients: Vec<Patient>,
    notes: Vec<MedicalNote>,
}

/// Record store held entirely in process memory.
///
/// Writes can be switched to fail, which lets callers exercise their store-failure paths.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Records>,
    fail_patient_writes: AtomicBool,
    fail_note_writes: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent patient creates/updates fail with [`StoreError::Unavailable`].
    pub fn fail_patient_writes(&self, fail: bool) {
        self.fail_patient_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent note writes fail with [`StoreError::Unavailable`].
    pub fn fail_note_writes(&self, fail: bool) {
        self.fail_note_writes.store(fail, Ordering::SeqCst);
    }

    fn records(&self) -> WardResult<MutexGuard<'_, Records>> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()).into())
    }

    fn check_writable(flag: &AtomicBool, what: &str) -> WardResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} writes are failing", what)).into());
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_patients(&self) -> WardResult<Vec<Patient>> {
        Ok(self.records()?.patients.clone())
    }

    async fn create_patient(&self, patient: NewPatient) -> WardResult<Patient> {
        Self::check_writable(&self.fail_patient_writes, "patient")?;
        let patient = patient.into_patient(RecordId::new());
        self.records()?.patients.push(patient.clone());
        Ok(patient)
    }

    async fn update_patient(&self, id: RecordId, update: PatientUpdate) -> WardResult<Patient> {
        Self::check_writable(&self.fail_patient_writes, "patient")?;
        let mut records = self.records()?;
        let stored = records
            .patients
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| WardError::patient_not_found(id))?;

        let mut updated = stored.clone();
        updated.apply(&update)?;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn add_note(&self, note: NewNote) -> WardResult<MedicalNote> {
        Self::check_writable(&self.fail_note_writes, "note")?;
        let mut records = self.records()?;
        if !records.patients.iter().any(|p| p.id() == note.patient_id) {
            return Err(WardError::patient_not_found(note.patient_id));
        }
        let note = note.into_note(RecordId::new());
        records.notes.push(note.clone());
        Ok(note)
    }

    async fn list_notes(&self, patient_id: RecordId) -> WardResult<Vec<MedicalNote>> {
        let records = self.records()?;
        if !records.patients.iter().any(|p| p.id() == patient_id) {
            return Err(WardError::patient_not_found(patient_id));
        }
        Ok(records
            .notes
            .iter()
            .filter(|n| n.patient_id == patient_id)
            .cloned()
            .collect())
    }
}
