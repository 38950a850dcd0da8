//! File-backed record store.
//!
//! ## Storage Layout
//!
//! ```text
//! patients/
//!   <s1>/
//!     <s2>/
//!       <id>/
//!         patient.json    # the patient record
//!         notes.json      # the medical note ledger, in insertion order
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the patient id.
//!
//! Files are replaced atomically (write to a temporary sibling, then rename) and every write
//! is serialised through one lock, so readers never observe a half-written record.

use super::RecordStore;
use crate::constants::{NOTES_JSON_FILENAME, PATIENT_JSON_FILENAME};
use crate::note::{MedicalNote, NewNote};
use crate::patient::{NewPatient, Patient, PatientUpdate};
use crate::{RecordId, StoreError, WardError, WardResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

struct Layout {
    patients_dir: PathBuf,
    write_lock: Mutex<()>,
}

/// Record store persisting JSON files under a sharded directory tree.
#[derive(Clone)]
pub struct FileRecordStore {
    layout: Arc<Layout>,
}

impl FileRecordStore {
    /// Opens (creating if needed) the store rooted at `patients_dir`.
    pub fn open(patients_dir: impl Into<PathBuf>) -> WardResult<Self> {
        let patients_dir = patients_dir.into();
        fs::create_dir_all(&patients_dir).map_err(StoreError::DirCreation)?;
        tracing::debug!("file record store at {}", patients_dir.display());

        Ok(Self {
            layout: Arc::new(Layout {
                patients_dir,
                write_lock: Mutex::new(()),
            }),
        })
    }

    pub fn patients_dir(&self) -> &Path {
        &self.layout.patients_dir
    }

    async fn blocking<T, F>(&self, op: F) -> WardResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Layout) -> WardResult<T> + Send + 'static,
    {
        let layout = Arc::clone(&self.layout);
        tokio::task::spawn_blocking(move || op(&layout))
            .await
            .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))?
    }
}

impl Layout {
    fn patient_dir(&self, id: RecordId) -> PathBuf {
        id.sharded_dir(&self.patients_dir)
    }

    fn lock(&self) -> WardResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("file store lock poisoned".into()).into())
    }

    fn read_patient(&self, id: RecordId) -> WardResult<Patient> {
        let path = self.patient_dir(id).join(PATIENT_JSON_FILENAME);
        if !path.is_file() {
            return Err(WardError::patient_not_found(id));
        }
        read_json(&path)
    }

    fn read_notes(&self, id: RecordId) -> WardResult<Vec<MedicalNote>> {
        let path = self.patient_dir(id).join(NOTES_JSON_FILENAME);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    fn create_patient(&self, patient: NewPatient) -> WardResult<Patient> {
        let _guard = self.lock()?;

        let patient = patient.into_patient(RecordId::new());
        let patient_dir = self.patient_dir(patient.id());

        let result = fs::create_dir_all(&patient_dir)
            .map_err(StoreError::DirCreation)
            .and_then(|()| write_json(&patient_dir.join(PATIENT_JSON_FILENAME), &patient));

        if let Err(create_error) = result {
            if patient_dir.exists() {
                if let Err(cleanup_error) = fs::remove_dir_all(&patient_dir) {
                    return Err(StoreError::CleanupAfterCreateFailed {
                        path: patient_dir,
                        create_error: Box::new(create_error),
                        cleanup_error,
                    }
                    .into());
                }
            }
            return Err(create_error.into());
        }

        Ok(patient)
    }

    fn update_patient(&self, id: RecordId, update: &PatientUpdate) -> WardResult<Patient> {
        let _guard = self.lock()?;

        let mut patient = self.read_patient(id)?;
        patient.apply(update)?;
        write_json(
            &self.patient_dir(id).join(PATIENT_JSON_FILENAME),
            &patient,
        )?;

        Ok(patient)
    }

    fn add_note(&self, note: NewNote) -> WardResult<MedicalNote> {
        let _guard = self.lock()?;

        // Notes never outlive their patient: refuse orphans.
        self.read_patient(note.patient_id)?;

        let mut notes = self.read_notes(note.patient_id)?;
        let note = note.into_note(RecordId::new());
        notes.push(note.clone());
        write_json(
            &self.patient_dir(note.patient_id).join(NOTES_JSON_FILENAME),
            &notes,
        )?;

        Ok(note)
    }

    fn list_notes(&self, patient_id: RecordId) -> WardResult<Vec<MedicalNote>> {
        if !self.patient_dir(patient_id).is_dir() {
            return Err(WardError::patient_not_found(patient_id));
        }
        self.read_notes(patient_id)
    }

    /// Walks `<patients>/<s1>/<s2>/<id>/patient.json`.
    ///
    /// Unreadable or unparseable records are logged and skipped. The result is ordered by
    /// admission date, then id.
    fn list_patients(&self) -> Vec<Patient> {
        let mut patients = Vec::new();

        let s1_iter = match fs::read_dir(&self.patients_dir) {
            Ok(it) => it,
            Err(_) => return patients,
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let patient_path = id_ent.path().join(PATIENT_JSON_FILENAME);
                    if !patient_path.is_file() {
                        continue;
                    }

                    match read_json::<Patient>(&patient_path) {
                        Ok(patient) => patients.push(patient),
                        Err(e) => {
                            tracing::warn!(
                                "failed to load patient record: {} - {}",
                                patient_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        patients.sort_by_key(|p| (p.admission_date(), p.id()));
        patients
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> WardResult<T> {
    let contents = fs::read_to_string(path).map_err(StoreError::FileRead)?;
    serde_json::from_str(&contents).map_err(|e| StoreError::Deserialization(e).into())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(StoreError::Serialization)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(StoreError::FileWrite)?;
    fs::rename(&tmp_path, path).map_err(StoreError::FileWrite)
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn list_patients(&self) -> WardResult<Vec<Patient>> {
        self.blocking(|layout| Ok(layout.list_patients())).await
    }

    async fn create_patient(&self, patient: NewPatient) -> WardResult<Patient> {
        self.blocking(move |layout| layout.create_patient(patient))
            .await
    }

    async fn update_patient(&self, id: RecordId, update: PatientUpdate) -> WardResult<Patient> {
        self.blocking(move |layout| layout.update_patient(id, &update))
            .await
    }

    async fn add_note(&self, note: NewNote) -> WardResult<MedicalNote> {
        self.blocking(move |layout| layout.add_note(note)).await
    }

    async fn list_notes(&self, patient_id: RecordId) -> WardResult<Vec<MedicalNote>> {
        self.blocking(move |layout| layout.list_notes(patient_id))
            .await
    }
}
