//! Mapping between `ward-core` records and the protobuf wire types.
//!
//! Outbound conversions are infallible `From` impls. Inbound parsing returns
//! [`WardError::Validation`] so that both APIs report malformed identifiers and dates the same
//! way they report malformed forms.

use crate::pb;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use ward_core::extract::{csv_filename, to_csv};
use ward_core::{
    AdmissionForm, DailyReport, DetailsUpdate, MedicalNote, NoteDraft, Patient, PatientFilter,
    PatientNotes, RecordId, WardError, WardResult,
};

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_patient_id(id: &str) -> WardResult<RecordId> {
    RecordId::parse(id.trim())
        .map_err(|_| WardError::validation(format!("invalid patient id '{}'", id)))
}

/// Parses a `YYYY-MM-DD` calendar day.
pub fn parse_day(day: &str) -> WardResult<NaiveDate> {
    NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d")
        .map_err(|_| WardError::validation(format!("invalid date '{}', expected YYYY-MM-DD", day)))
}

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(at: &str) -> WardResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(at.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| WardError::validation(format!("invalid timestamp '{}'", at)))
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

/// Deserialises a JSON string or number into its text form, leaving validation to the form.
pub fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(
        match <TextOrNumber as serde::Deserialize>::deserialize(deserializer)? {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Unsigned(n) => n.to_string(),
            TextOrNumber::Signed(n) => n.to_string(),
            TextOrNumber::Float(n) => n.to_string(),
        },
    )
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

pub fn patient_filter(req: &pb::ListPatientsReq) -> WardResult<PatientFilter> {
    Ok(PatientFilter {
        specialty: non_blank(&req.specialty).map(str::parse).transpose()?,
        status: non_blank(&req.status).map(str::parse).transpose()?,
        mrn: non_blank(&req.mrn).map(str::to_string),
    })
}

pub fn note_draft(req: pb::AddNoteReq) -> WardResult<NoteDraft> {
    let mut draft = NoteDraft::new(parse_patient_id(&req.patient_id)?, req.note);
    if let Some(user) = req.user {
        draft = draft.by(user);
    }
    if let Some(date) = req.date.as_deref().and_then(non_blank) {
        draft = draft.at(parse_timestamp(date)?);
    }
    Ok(draft)
}

impl From<pb::AdmitPatientReq> for AdmissionForm {
    fn from(req: pb::AdmitPatientReq) -> Self {
        Self {
            name: req.name,
            mrn: req.mrn,
            age: req.age,
            gender: req.gender,
            diagnosis: req.diagnosis,
            specialty: req.specialty,
            assigned_doctor: req.assigned_doctor,
        }
    }
}

impl From<pb::UpdatePatientReq> for DetailsUpdate {
    fn from(req: pb::UpdatePatientReq) -> Self {
        Self {
            diagnosis: req.diagnosis,
            assigned_doctor: req.assigned_doctor,
        }
    }
}

impl From<&Patient> for pb::Patient {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id().to_string(),
            mrn: p.mrn().to_string(),
            name: p.name().to_string(),
            age: p.age().years(),
            gender: p.gender().to_string(),
            diagnosis: p.diagnosis().to_string(),
            specialty: p.specialty().to_string(),
            assigned_doctor: p.assigned_doctor().map(ToString::to_string),
            admission_date: timestamp(p.admission_date()),
            status: p.status().to_string(),
            discharge_date: p.discharge_date().map(timestamp),
            days_admitted: p.days_admitted(Utc::now()),
        }
    }
}

impl From<&MedicalNote> for pb::MedicalNote {
    fn from(n: &MedicalNote) -> Self {
        Self {
            id: n.id.to_string(),
            patient_id: n.patient_id.to_string(),
            date: timestamp(n.date),
            note: n.note.to_string(),
            user: n.user.to_string(),
        }
    }
}

impl From<&DailyReport> for pb::DailyReportRes {
    fn from(report: &DailyReport) -> Self {
        Self {
            date: timestamp(report.date),
            specialties: report
                .specialties
                .iter()
                .map(|(specialty, census)| pb::SpecialtyCensus {
                    specialty: specialty.to_string(),
                    active_patients: census.active_patients.iter().map(Into::into).collect(),
                    discharged_patients: census
                        .discharged_patients
                        .iter()
                        .map(Into::into)
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<&PatientNotes> for pb::PatientNotes {
    fn from(row: &PatientNotes) -> Self {
        Self {
            patient: Some((&row.patient).into()),
            notes: row.notes.iter().map(Into::into).collect(),
        }
    }
}

/// Builds the extraction response, including the rendered CSV and its filename.
pub fn extract_res(date: NaiveDate, rows: &[PatientNotes]) -> pb::ExtractNotesRes {
    pb::ExtractNotesRes {
        date: date.format("%Y-%m-%d").to_string(),
        patients: rows.iter().map(Into::into).collect(),
        csv_filename: csv_filename(date),
        csv: to_csv(rows),
    }
}
