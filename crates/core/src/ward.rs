//! The ward service: owner of the in-memory patient collection.
//!
//! Every API layer holds a clone of one [`WardService`]. Reads are served from the
//! collection; writes go to the record store first, and the confirmed record then replaces
//! the cached one. Lifecycle mutations are serialised through a single writer lock, so the
//! precondition checks and the store writes of one operation are never interleaved with
//! another mutation in this process.

use crate::config::CoreConfig;
use crate::constants::{DISCHARGE_NOTE_PREFIX, DISCHARGE_REQUESTED_NOTES};
use crate::extract::{self, PatientNotes};
use crate::note::{MedicalNote, NewNote, NoteDraft};
use crate::patient::{AdmissionForm, DetailsUpdate, Patient, PatientFilter, PatientUpdate};
use crate::report::DailyReport;
use crate::store::RecordStore;
use crate::{FreeText, NonEmptyText, RecordId, WardError, WardResult};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Clone)]
pub struct WardService {
    store: Arc<dyn RecordStore>,
    patients: Arc<RwLock<Vec<Patient>>>,
    writer: Arc<Mutex<()>>,
    system_user: NonEmptyText,
}

impl WardService {
    /// Creates a service with an empty collection. Call [`WardService::refresh`] to load it.
    pub fn new(cfg: &CoreConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            patients: Arc::new(RwLock::new(Vec::new())),
            writer: Arc::new(Mutex::new(())),
            system_user: cfg.system_user().clone(),
        }
    }

    /// Creates a service and loads the patient collection from the store.
    pub async fn load(cfg: &CoreConfig, store: Arc<dyn RecordStore>) -> WardResult<Self> {
        let service = Self::new(cfg, store);
        service.refresh().await?;
        Ok(service)
    }

    /// Replaces the collection with the store's current patient list.
    pub async fn refresh(&self) -> WardResult<usize> {
        let _writer = self.writer.lock().await;
        let loaded = self.store.list_patients().await?;
        let count = loaded.len();
        *self.patients.write().await = loaded;
        tracing::debug!("loaded {} patients", count);
        Ok(count)
    }

    pub async fn patients(&self) -> Vec<Patient> {
        self.patients.read().await.clone()
    }

    pub async fn patients_matching(&self, filter: &PatientFilter) -> Vec<Patient> {
        self.patients
            .read()
            .await
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect()
    }

    pub async fn patient(&self, id: RecordId) -> WardResult<Patient> {
        self.patients
            .read()
            .await
            .iter()
            .find(|p| p.id() == id)
            .cloned()
            .ok_or_else(|| WardError::patient_not_found(id))
    }

    pub async fn find_active_by_mrn(&self, mrn: &str) -> Option<Patient> {
        let mrn = mrn.trim();
        self.patients
            .read()
            .await
            .iter()
            .find(|p| p.is_active() && p.mrn().as_str() == mrn)
            .cloned()
    }

    /// Admits a new patient.
    ///
    /// # Errors
    ///
    /// - [`WardError::Validation`] if the form is incomplete or malformed.
    /// - [`WardError::DuplicateMrn`] if an `Active` patient already holds the mrn.
    /// - [`WardError::Store`] if the store rejects the write; nothing is added.
    pub async fn admit(&self, form: &AdmissionForm) -> WardResult<Patient> {
        let new_patient = form.validate(Utc::now())?;

        let _writer = self.writer.lock().await;
        if self
            .find_active_by_mrn(new_patient.mrn.as_str())
            .await
            .is_some()
        {
            return Err(WardError::DuplicateMrn(new_patient.mrn.to_string()));
        }

        let patient = self.store.create_patient(new_patient).await?;
        self.patients.write().await.push(patient.clone());

        tracing::info!(
            "admitted patient {} (mrn {}) to {}",
            patient.id(),
            patient.mrn(),
            patient.specialty()
        );
        Ok(patient)
    }

    /// Discharges an `Active` patient and records the discharge note.
    ///
    /// The status change and the note are both written before the collection changes. If
    /// the note cannot be written the status change is reverted in the store and the error
    /// is returned. `notes` may be empty; the note always carries the discharge prefix.
    ///
    /// # Errors
    ///
    /// - [`WardError::NotFound`] if `id` is not an `Active` patient.
    /// - [`WardError::Store`] if either write fails.
    pub async fn discharge(&self, id: RecordId, notes: &str) -> WardResult<Patient> {
        let _writer = self.writer.lock().await;
        let current = self.patient(id).await?;
        if !current.is_active() {
            return Err(WardError::NotFound(format!("active patient {}", id)));
        }

        let now = Utc::now();
        let discharged = self
            .store
            .update_patient(id, PatientUpdate::discharge(now))
            .await?;

        let note = NewNote {
            patient_id: id,
            date: now,
            note: FreeText::new(format!("{}{}", DISCHARGE_NOTE_PREFIX, notes))
                .map_err(|_| WardError::validation("discharge note is empty"))?,
            user: self.system_user.clone(),
        };
        if let Err(e) = self.store.add_note(note).await {
            tracing::error!("discharge note for patient {} failed: {}", id, e);
            if let Err(revert) = self
                .store
                .update_patient(id, PatientUpdate::reactivate())
                .await
            {
                tracing::error!(
                    "could not revert discharge of patient {}: {}",
                    id,
                    revert
                );
                // The store still holds the discharge.
                self.replace(discharged).await;
            }
            return Err(e);
        }

        self.replace(discharged.clone()).await;
        tracing::info!("discharged patient {}", id);
        Ok(discharged)
    }

    /// Discharges the `Active` patient holding `mrn`, if there is one.
    ///
    /// An unknown mrn is a normal outcome and yields `Ok(None)`.
    pub async fn request_discharge(&self, mrn: &str) -> WardResult<Option<Patient>> {
        let Some(patient) = self.find_active_by_mrn(mrn).await else {
            tracing::info!("discharge requested for mrn {} with no active patient", mrn.trim());
            return Ok(None);
        };

        match self.discharge(patient.id(), DISCHARGE_REQUESTED_NOTES).await {
            Ok(discharged) => Ok(Some(discharged)),
            // Discharged concurrently between lookup and discharge.
            Err(WardError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Edits the clinical details of an existing patient. Status is never changed.
    pub async fn update_details(&self, id: RecordId, details: &DetailsUpdate) -> WardResult<Patient> {
        let update = details.validate()?;

        let _writer = self.writer.lock().await;
        self.patient(id).await?;
        let updated = self.store.update_patient(id, update).await?;
        self.replace(updated.clone()).await;

        tracing::info!("updated details of patient {}", id);
        Ok(updated)
    }

    /// Appends a note to an existing patient's ledger.
    pub async fn add_note(&self, draft: NoteDraft) -> WardResult<MedicalNote> {
        let note = draft.validate(Utc::now())?;
        self.patient(note.patient_id).await?;

        let note = self.store.add_note(note).await?;
        tracing::debug!("added note {} for patient {}", note.id, note.patient_id);
        Ok(note)
    }

    pub async fn list_notes(&self, patient_id: RecordId) -> WardResult<Vec<MedicalNote>> {
        self.patient(patient_id).await?;
        self.store.list_notes(patient_id).await
    }

    pub async fn list_notes_by_date(
        &self,
        patient_id: RecordId,
        date: NaiveDate,
    ) -> WardResult<Vec<MedicalNote>> {
        self.patient(patient_id).await?;
        self.store.list_notes_by_date(patient_id, date).await
    }

    /// Census of the collection as it is right now.
    pub async fn daily_report(&self) -> DailyReport {
        DailyReport::generate(&self.patients.read().await, Utc::now())
    }

    /// Notes written on `date`, grouped by patient. Patients without notes are left out.
    pub async fn extract(&self, date: NaiveDate) -> WardResult<Vec<PatientNotes>> {
        let patients = self.patients().await;
        extract::extract_notes(self.store.as_ref(), patients, date).await
    }

    async fn replace(&self, patient: Patient) {
        let mut patients = self.patients.write().await;
        match patients.iter_mut().find(|p| p.id() == patient.id()) {
            Some(slot) => *slot = patient,
            None => patients.push(patient),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::tests::form;
    use crate::patient::NewPatient;
    use crate::{
        FileRecordStore, InMemoryRecordStore, PatientStatus, Specialty, StoreError, StoreKind,
    };
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cfg() -> CoreConfig {
        CoreConfig::new(
            PathBuf::from("unused"),
            StoreKind::Memory,
            NonEmptyText::new("System").unwrap(),
        )
        .unwrap()
    }

    fn memory_ward() -> (WardService, Arc<InMemoryRecordStore>) {
        let store = Arc::new(InMemoryRecordStore::new());
        let service = WardService::new(&cfg(), store.clone());
        (service, store)
    }

    #[tokio::test]
    async fn admitted_patient_is_active_and_listed() {
        let (ward, _) = memory_ward();

        let patient = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();

        assert_eq!(patient.status(), PatientStatus::Active);
        assert!(patient.discharge_date().is_none());
        assert_eq!(ward.patients().await, vec![patient.clone()]);
        assert_eq!(ward.patient(patient.id()).await.unwrap(), patient);
    }

    #[tokio::test]
    async fn duplicate_active_mrn_is_rejected() {
        let (ward, _) = memory_ward();
        ward.admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();

        let err = ward
            .admit(&form("Other", "M1", Specialty::Neurology))
            .await
            .unwrap_err();
        assert!(matches!(err, WardError::DuplicateMrn(mrn) if mrn == "M1"));
        assert_eq!(ward.patients().await.len(), 1);
    }

    #[tokio::test]
    async fn mrn_can_be_readmitted_after_discharge() {
        let (ward, _) = memory_ward();
        let first = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();
        ward.discharge(first.id(), "Home").await.unwrap();

        let again = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();
        assert_ne!(again.id(), first.id());
    }

    #[tokio::test]
    async fn invalid_admission_changes_nothing() {
        let (ward, store) = memory_ward();
        let mut f = form("Ada", "M1", Specialty::Hematology);
        f.age = "zero".into();

        let err = ward.admit(&f).await.unwrap_err();
        assert!(matches!(err, WardError::Validation(_)));
        assert!(ward.patients().await.is_empty());
        assert!(store.list_patients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_store_write_does_not_admit() {
        let (ward, store) = memory_ward();
        store.fail_patient_writes(true);

        let err = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap_err();
        assert!(matches!(err, WardError::Store(_)));
        assert!(ward.patients().await.is_empty());
    }

    #[tokio::test]
    async fn discharge_sets_status_and_appends_one_note() {
        let (ward, _) = memory_ward();
        let patient = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();

        let discharged = ward.discharge(patient.id(), "Stable, home").await.unwrap();

        assert_eq!(discharged.status(), PatientStatus::Discharged);
        let discharge_date = discharged.discharge_date().unwrap();
        let notes = ward.list_notes(patient.id()).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].note.as_str().contains("Stable, home"));
        assert_eq!(notes[0].user.as_str(), "System");
        assert!(notes[0].date >= discharge_date);
        assert_eq!(ward.patient(patient.id()).await.unwrap(), discharged);
    }

    #[tokio::test]
    async fn discharging_twice_or_unknown_is_not_found() {
        let (ward, _) = memory_ward();
        let patient = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();
        let first = ward.discharge(patient.id(), "Home").await.unwrap();

        let err = ward.discharge(patient.id(), "Again").await.unwrap_err();
        assert!(matches!(err, WardError::NotFound(_)));
        assert_eq!(ward.patient(patient.id()).await.unwrap(), first);
        assert_eq!(ward.list_notes(patient.id()).await.unwrap().len(), 1);

        let err = ward.discharge(RecordId::new(), "Home").await.unwrap_err();
        assert!(matches!(err, WardError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_discharge_note_reverts_the_discharge() {
        let (ward, store) = memory_ward();
        let patient = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();
        store.fail_note_writes(true);

        let err = ward.discharge(patient.id(), "Home").await.unwrap_err();

        assert!(matches!(err, WardError::Store(StoreError::Unavailable(_))));
        assert!(ward.patient(patient.id()).await.unwrap().is_active());
        let stored = store.list_patients().await.unwrap();
        assert!(stored[0].is_active(), "store should be reverted");
        assert!(store.list_notes(patient.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn discharge_accepts_empty_notes() {
        let (ward, _) = memory_ward();
        let patient = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();

        let discharged = ward.discharge(patient.id(), "").await.unwrap();

        assert_eq!(discharged.status(), PatientStatus::Discharged);
        let notes = ward.list_notes(patient.id()).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].note.as_str(), DISCHARGE_NOTE_PREFIX);
    }

    #[tokio::test]
    async fn discharge_of_unknown_patient_with_empty_notes_is_not_found() {
        let (ward, _) = memory_ward();
        let err = ward.discharge(RecordId::new(), "").await.unwrap_err();
        assert!(matches!(err, WardError::NotFound(_)));
    }

    /// Fails every note write and, from then on, every patient write.
    struct BrokenAfterDischarge(Arc<InMemoryRecordStore>);

    #[async_trait::async_trait]
    impl RecordStore for BrokenAfterDischarge {
        async fn list_patients(&self) -> WardResult<Vec<Patient>> {
            self.0.list_patients().await
        }

        async fn create_patient(&self, patient: NewPatient) -> WardResult<Patient> {
            self.0.create_patient(patient).await
        }

        async fn update_patient(&self, id: RecordId, update: PatientUpdate) -> WardResult<Patient> {
            self.0.update_patient(id, update).await
        }

        async fn add_note(&self, _note: NewNote) -> WardResult<MedicalNote> {
            self.0.fail_patient_writes(true);
            Err(StoreError::Unavailable("note writes are failing".into()).into())
        }

        async fn list_notes(&self, patient_id: RecordId) -> WardResult<Vec<MedicalNote>> {
            self.0.list_notes(patient_id).await
        }
    }

    #[tokio::test]
    async fn failed_revert_keeps_collection_in_step_with_store() {
        let inner = Arc::new(InMemoryRecordStore::new());
        let ward = WardService::new(&cfg(), Arc::new(BrokenAfterDischarge(inner.clone())));
        let patient = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();

        let err = ward.discharge(patient.id(), "Home").await.unwrap_err();
        assert!(matches!(err, WardError::Store(StoreError::Unavailable(_))));

        let stored = inner.list_patients().await.unwrap();
        assert!(!stored[0].is_active());
        assert!(!ward.patient(patient.id()).await.unwrap().is_active());
        assert!(ward.find_active_by_mrn("M1").await.is_none());
    }

    #[tokio::test]
    async fn request_discharge_by_mrn() {
        let (ward, _) = memory_ward();
        let patient = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();

        assert_eq!(ward.request_discharge("nope").await.unwrap(), None);
        assert!(ward.patient(patient.id()).await.unwrap().is_active());

        let discharged = ward.request_discharge(" M1 ").await.unwrap().unwrap();
        assert_eq!(discharged.id(), patient.id());
        assert_eq!(discharged.status(), PatientStatus::Discharged);
        let notes = ward.list_notes(patient.id()).await.unwrap();
        assert!(notes[0].note.as_str().contains("Discharge requested"));

        assert_eq!(ward.request_discharge("M1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn notes_require_an_existing_patient() {
        let (ward, _) = memory_ward();
        let err = ward
            .add_note(NoteDraft::new(RecordId::new(), "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, WardError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_details_keeps_status() {
        let (ward, _) = memory_ward();
        let patient = ward
            .admit(&form("Ada", "M1", Specialty::Hematology))
            .await
            .unwrap();

        let updated = ward
            .update_details(
                patient.id(),
                &DetailsUpdate {
                    diagnosis: Some("Sickle cell crisis".into()),
                    assigned_doctor: Some(String::new()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.diagnosis().as_str(), "Sickle cell crisis");
        assert!(updated.assigned_doctor().is_none());
        assert!(updated.is_active());
        assert_eq!(ward.patient(patient.id()).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn report_follows_admit_and_discharge() {
        let (ward, _) = memory_ward();
        let a = ward
            .admit(&form("A", "M1", Specialty::Hematology))
            .await
            .unwrap();

        let report = ward.daily_report().await;
        assert_eq!(
            report.census(Specialty::Hematology).active_patients[0].id(),
            a.id()
        );

        ward.discharge(a.id(), "Home").await.unwrap();
        let report = ward.daily_report().await;
        let census = report.census(Specialty::Hematology);
        assert!(census.active_patients.is_empty());
        assert_eq!(census.discharged_patients[0].id(), a.id());
    }

    #[tokio::test]
    async fn file_backed_service_reloads_state() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::new(
            temp_dir.path().to_path_buf(),
            StoreKind::File,
            NonEmptyText::new("System").unwrap(),
        )
        .unwrap();
        let store: Arc<dyn RecordStore> =
            Arc::new(FileRecordStore::open(cfg.patients_dir()).unwrap());

        let ward = WardService::load(&cfg, store.clone()).await.unwrap();
        let patient = ward
            .admit(&form("Ada", "M1", Specialty::Neurology))
            .await
            .unwrap();
        ward.discharge(patient.id(), "Home").await.unwrap();

        let reloaded = WardService::load(&cfg, store).await.unwrap();
        let patients = reloaded.patients().await;
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].status(), PatientStatus::Discharged);
        assert_eq!(reloaded.list_notes(patient.id()).await.unwrap().len(), 1);
    }
}
