//! Patient records and the admission/discharge lifecycle.
//!
//! A patient is admitted `Active` and moves to `Discharged` exactly once. The status is
//! derived from the discharge timestamp, so a patient can never be `Discharged` without a
//! discharge date or carry a discharge date while `Active`.

use crate::{Age, Mrn, NonEmptyText, RecordId, Specialty, WardError, WardResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = WardError;

    fn from_str(s: &str) -> WardResult<Self> {
        let wanted = s.trim();
        [Gender::Male, Gender::Female, Gender::Other]
            .into_iter()
            .find(|gender| gender.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                if wanted.is_empty() {
                    WardError::validation("gender is required")
                } else {
                    WardError::validation(format!(
                        "gender must be Male, Female or Other, got '{}'",
                        wanted
                    ))
                }
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientStatus {
    Active,
    Discharged,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Active => "Active",
            PatientStatus::Discharged => "Discharged",
        }
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatientStatus {
    type Err = WardError;

    fn from_str(s: &str) -> WardResult<Self> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("active") => Ok(PatientStatus::Active),
            v if v.eq_ignore_ascii_case("discharged") => Ok(PatientStatus::Discharged),
            other => Err(WardError::validation(format!(
                "status must be Active or Discharged, got '{}'",
                other
            ))),
        }
    }
}

/// A patient as held by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredPatient", try_from = "StoredPatient")]
pub struct Patient {
    id: RecordId,
    mrn: Mrn,
    name: NonEmptyText,
    age: Age,
    gender: Gender,
    diagnosis: NonEmptyText,
    specialty: Specialty,
    assigned_doctor: Option<NonEmptyText>,
    admission_date: DateTime<Utc>,
    discharge_date: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn mrn(&self) -> &Mrn {
        &self.mrn
    }

    pub fn name(&self) -> &NonEmptyText {
        &self.name
    }

    pub fn age(&self) -> Age {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn diagnosis(&self) -> &NonEmptyText {
        &self.diagnosis
    }

    pub fn specialty(&self) -> Specialty {
        self.specialty
    }

    pub fn assigned_doctor(&self) -> Option<&NonEmptyText> {
        self.assigned_doctor.as_ref()
    }

    pub fn admission_date(&self) -> DateTime<Utc> {
        self.admission_date
    }

    pub fn discharge_date(&self) -> Option<DateTime<Utc>> {
        self.discharge_date
    }

    pub fn status(&self) -> PatientStatus {
        match self.discharge_date {
            Some(_) => PatientStatus::Discharged,
            None => PatientStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == PatientStatus::Active
    }

    /// Whole days between admission and discharge, or `now` while still admitted.
    pub fn days_admitted(&self, now: DateTime<Utc>) -> i64 {
        let until = self.discharge_date.unwrap_or(now);
        (until - self.admission_date).num_days().max(0)
    }

    /// Applies a partial update, enforcing the lifecycle rules.
    ///
    /// # Errors
    ///
    /// Returns [`WardError::NotFound`] when discharging a patient that is not `Active`: an
    /// already-discharged patient has no active admission to close.
    pub fn apply(&mut self, update: &PatientUpdate) -> WardResult<()> {
        match update.status {
            Some(StatusChange::Discharged(at)) => {
                if !self.is_active() {
                    return Err(WardError::NotFound(format!(
                        "active patient {}",
                        self.id
                    )));
                }
                self.discharge_date = Some(at);
            }
            Some(StatusChange::Reactivated) => {
                self.discharge_date = None;
            }
            None => {}
        }

        if let Some(diagnosis) = &update.diagnosis {
            self.diagnosis = diagnosis.clone();
        }
        if let Some(doctor) = &update.assigned_doctor {
            self.assigned_doctor = doctor.clone();
        }

        Ok(())
    }
}

/// Lifecycle change carried by a [`PatientUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Close the admission at the given instant.
    Discharged(DateTime<Utc>),
    /// Reopen an admission. Only used to undo a discharge whose note could not be written.
    Reactivated,
}

/// Partial update sent to the record store. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientUpdate {
    pub status: Option<StatusChange>,
    pub diagnosis: Option<NonEmptyText>,
    /// `Some(None)` clears the assigned doctor.
    pub assigned_doctor: Option<Option<NonEmptyText>>,
}

impl PatientUpdate {
    pub fn discharge(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(StatusChange::Discharged(at)),
            ..Self::default()
        }
    }

    pub fn reactivate() -> Self {
        Self {
            status: Some(StatusChange::Reactivated),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.diagnosis.is_none() && self.assigned_doctor.is_none()
    }
}

/// Raw admission input as typed into a form or request body.
///
/// Every field is a plain string so that missing and malformed values can be reported as
/// validation failures rather than transport errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdmissionForm {
    pub name: String,
    pub mrn: String,
    pub age: String,
    pub gender: String,
    pub diagnosis: String,
    pub specialty: String,
    pub assigned_doctor: Option<String>,
}

impl AdmissionForm {
    /// Validates the form into a [`NewPatient`] admitted at `admitted_at`.
    ///
    /// # Errors
    ///
    /// Returns [`WardError::Validation`] naming the first missing or malformed field.
    pub fn validate(&self, admitted_at: DateTime<Utc>) -> WardResult<NewPatient> {
        let name = required("name", &self.name)?;
        let mrn = Mrn::new(&self.mrn).map_err(|_| WardError::validation("mrn is required"))?;
        let age = self
            .age
            .parse::<Age>()
            .map_err(|e| WardError::validation(e.to_string()))?;
        let gender = self.gender.parse::<Gender>()?;
        let diagnosis = required("diagnosis", &self.diagnosis)?;
        let specialty = self.specialty.parse::<Specialty>()?;
        let assigned_doctor = self
            .assigned_doctor
            .as_deref()
            .and_then(|doctor| NonEmptyText::new(doctor).ok());

        Ok(NewPatient {
            mrn,
            name,
            age,
            gender,
            diagnosis,
            specialty,
            assigned_doctor,
            admission_date: admitted_at,
        })
    }
}

/// Editable clinical details of an admitted patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DetailsUpdate {
    pub diagnosis: Option<String>,
    /// An empty string clears the assigned doctor.
    pub assigned_doctor: Option<String>,
}

impl DetailsUpdate {
    pub fn validate(&self) -> WardResult<PatientUpdate> {
        let diagnosis = self
            .diagnosis
            .as_deref()
            .map(|d| required("diagnosis", d))
            .transpose()?;
        let assigned_doctor = self
            .assigned_doctor
            .as_deref()
            .map(|doctor| NonEmptyText::new(doctor).ok());

        let update = PatientUpdate {
            status: None,
            diagnosis,
            assigned_doctor,
        };
        if update.is_empty() {
            return Err(WardError::validation("no patient details to update"));
        }
        Ok(update)
    }
}

/// A validated admission waiting for a store-assigned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub mrn: Mrn,
    pub name: NonEmptyText,
    pub age: Age,
    pub gender: Gender,
    pub diagnosis: NonEmptyText,
    pub specialty: Specialty,
    pub assigned_doctor: Option<NonEmptyText>,
    pub admission_date: DateTime<Utc>,
}

impl NewPatient {
    /// Builds the stored record. New patients are always `Active`.
    pub fn into_patient(self, id: RecordId) -> Patient {
        Patient {
            id,
            mrn: self.mrn,
            name: self.name,
            age: self.age,
            gender: self.gender,
            diagnosis: self.diagnosis,
            specialty: self.specialty,
            assigned_doctor: self.assigned_doctor,
            admission_date: self.admission_date,
            discharge_date: None,
        }
    }
}

/// Selection over the patient collection. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientFilter {
    pub specialty: Option<Specialty>,
    pub status: Option<PatientStatus>,
    pub mrn: Option<String>,
}

impl PatientFilter {
    pub fn active_in(specialty: Specialty) -> Self {
        Self {
            specialty: Some(specialty),
            status: Some(PatientStatus::Active),
            mrn: None,
        }
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        self.specialty.map_or(true, |s| patient.specialty() == s)
            && self.status.map_or(true, |s| patient.status() == s)
            && self
                .mrn
                .as_deref()
                .map_or(true, |mrn| patient.mrn().as_str() == mrn.trim())
    }
}

fn required(field: &str, value: &str) -> WardResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| WardError::validation(format!("{} is required", field)))
}

/// On-disk/wire shape of a patient, with the status spelled out.
#[derive(Serialize, Deserialize)]
struct StoredPatient {
    id: RecordId,
    mrn: Mrn,
    name: NonEmptyText,
    age: Age,
    gender: Gender,
    diagnosis: NonEmptyText,
    specialty: Specialty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assigned_doctor: Option<NonEmptyText>,
    admission_date: DateTime<Utc>,
    status: PatientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discharge_date: Option<DateTime<Utc>>,
}

impl From<Patient> for StoredPatient {
    fn from(p: Patient) -> Self {
        let status = p.status();
        Self {
            id: p.id,
            mrn: p.mrn,
            name: p.name,
            age: p.age,
            gender: p.gender,
            diagnosis: p.diagnosis,
            specialty: p.specialty,
            assigned_doctor: p.assigned_doctor,
            admission_date: p.admission_date,
            status,
            discharge_date: p.discharge_date,
        }
    }
}

impl TryFrom<StoredPatient> for Patient {
    type Error = String;

    fn try_from(s: StoredPatient) -> Result<Self, Self::Error> {
        match (s.status, s.discharge_date) {
            (PatientStatus::Active, Some(_)) => {
                return Err(format!("patient {} is Active but has a discharge date", s.id))
            }
            (PatientStatus::Discharged, None) => {
                return Err(format!(
                    "patient {} is Discharged but has no discharge date",
                    s.id
                ))
            }
            _ => {}
        }

        Ok(Self {
            id: s.id,
            mrn: s.mrn,
            name: s.name,
            age: s.age,
            gender: s.gender,
            diagnosis: s.diagnosis,
            specialty: s.specialty,
            assigned_doctor: s.assigned_doctor,
            admission_date: s.admission_date,
            discharge_date: s.discharge_date,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub(crate) fn form(name: &str, mrn: &str, specialty: Specialty) -> AdmissionForm {
        AdmissionForm {
            name: name.into(),
            mrn: mrn.into(),
            age: "54".into(),
            gender: "Female".into(),
            diagnosis: "Community-acquired pneumonia".into(),
            specialty: specialty.as_str().into(),
            assigned_doctor: Some("Dr Okafor".into()),
        }
    }

    fn admitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 9, 30, 0).unwrap()
    }

    #[test]
    fn valid_form_produces_active_patient() {
        let new_patient = form("Ada Lovelace", "M1", Specialty::Hematology)
            .validate(admitted_at())
            .expect("form should validate");
        let patient = new_patient.into_patient(RecordId::new());

        assert_eq!(patient.status(), PatientStatus::Active);
        assert_eq!(patient.discharge_date(), None);
        assert_eq!(patient.admission_date(), admitted_at());
        assert_eq!(patient.mrn().as_str(), "M1");
        assert_eq!(patient.age().years(), 54);
        assert_eq!(
            patient.assigned_doctor().map(NonEmptyText::as_str),
            Some("Dr Okafor")
        );
    }

    #[test]
    fn blank_assigned_doctor_is_absent() {
        let mut f = form("Ada", "M1", Specialty::Neurology);
        f.assigned_doctor = Some("   ".into());
        let new_patient = f.validate(admitted_at()).unwrap();
        assert!(new_patient.assigned_doctor.is_none());
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let cases: Vec<(&str, Box<dyn Fn(&mut AdmissionForm)>)> = vec![
            ("name", Box::new(|f: &mut AdmissionForm| f.name.clear())),
            ("mrn", Box::new(|f: &mut AdmissionForm| f.mrn = "  ".into())),
            ("age", Box::new(|f: &mut AdmissionForm| f.age.clear())),
            ("gender", Box::new(|f: &mut AdmissionForm| f.gender.clear())),
            ("diagnosis", Box::new(|f: &mut AdmissionForm| f.diagnosis.clear())),
            ("specialty", Box::new(|f: &mut AdmissionForm| f.specialty.clear())),
        ];

        for (field, mutate) in cases {
            let mut f = form("Ada", "M1", Specialty::Hematology);
            mutate(&mut f);
            let err = f.validate(admitted_at()).unwrap_err();
            match err {
                WardError::Validation(msg) => {
                    assert!(msg.contains(field), "'{}' should mention {}", msg, field)
                }
                other => panic!("expected validation error for {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn non_numeric_or_non_positive_age_is_rejected() {
        for age in ["abc", "0", "-4", "12.5"] {
            let mut f = form("Ada", "M1", Specialty::Hematology);
            f.age = age.into();
            assert!(
                matches!(f.validate(admitted_at()), Err(WardError::Validation(_))),
                "age '{}' should be rejected",
                age
            );
        }
    }

    #[test]
    fn discharge_sets_status_and_date_together() {
        let mut patient = form("Ada", "M1", Specialty::Hematology)
            .validate(admitted_at())
            .unwrap()
            .into_patient(RecordId::new());
        let at = admitted_at() + Duration::days(3);

        patient.apply(&PatientUpdate::discharge(at)).unwrap();

        assert_eq!(patient.status(), PatientStatus::Discharged);
        assert_eq!(patient.discharge_date(), Some(at));
        assert_eq!(patient.days_admitted(at + Duration::days(10)), 3);
    }

    #[test]
    fn discharging_twice_is_not_found_and_keeps_first_date() {
        let mut patient = form("Ada", "M1", Specialty::Hematology)
            .validate(admitted_at())
            .unwrap()
            .into_patient(RecordId::new());
        let first = admitted_at() + Duration::hours(5);
        patient.apply(&PatientUpdate::discharge(first)).unwrap();

        let err = patient
            .apply(&PatientUpdate::discharge(first + Duration::days(1)))
            .unwrap_err();

        assert!(matches!(err, WardError::NotFound(_)));
        assert_eq!(patient.discharge_date(), Some(first));
    }

    #[test]
    fn serde_round_trip_keeps_status_consistent() {
        let mut patient = form("Ada", "M1", Specialty::Pulmonology)
            .validate(admitted_at())
            .unwrap()
            .into_patient(RecordId::new());
        patient
            .apply(&PatientUpdate::discharge(admitted_at() + Duration::days(1)))
            .unwrap();

        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["status"], "Discharged");
        assert_eq!(json["specialty"], "Pulmonology");

        let back: Patient = serde_json::from_value(json).unwrap();
        assert_eq!(back, patient);
    }

    #[test]
    fn deserialise_rejects_inconsistent_status() {
        let patient = form("Ada", "M1", Specialty::Pulmonology)
            .validate(admitted_at())
            .unwrap()
            .into_patient(RecordId::new());
        let mut json = serde_json::to_value(&patient).unwrap();
        json["status"] = "Discharged".into();

        assert!(serde_json::from_value::<Patient>(json).is_err());
    }

    #[test]
    fn details_update_requires_a_change() {
        let err = DetailsUpdate::default().validate().unwrap_err();
        assert!(matches!(err, WardError::Validation(_)));

        let update = DetailsUpdate {
            diagnosis: None,
            assigned_doctor: Some(String::new()),
        }
        .validate()
        .unwrap();
        assert_eq!(update.assigned_doctor, Some(None));
    }

    #[test]
    fn filter_matches_specialty_status_and_mrn() {
        let patient = form("Ada", "M1", Specialty::Hematology)
            .validate(admitted_at())
            .unwrap()
            .into_patient(RecordId::new());

        assert!(PatientFilter::active_in(Specialty::Hematology).matches(&patient));
        assert!(!PatientFilter::active_in(Specialty::Neurology).matches(&patient));
        assert!(PatientFilter {
            mrn: Some(" M1".into()),
            ..PatientFilter::default()
        }
        .matches(&patient));
        assert!(!PatientFilter {
            status: Some(PatientStatus::Discharged),
            ..PatientFilter::default()
        }
        .matches(&patient));
    }
}
