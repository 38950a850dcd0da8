//! Per-day note extraction and its CSV rendering.

use crate::constants::CSV_HEADER;
use crate::store::RecordStore;
use crate::{MedicalNote, Patient, WardResult};
use chrono::NaiveDate;
use futures_util::future::try_join_all;
use serde::Serialize;

/// A patient together with the notes written on the extracted day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientNotes {
    pub patient: Patient,
    pub notes: Vec<MedicalNote>,
}

/// Looks up the notes of every patient on `date` concurrently.
///
/// Patients without notes that day are left out. Any failed lookup fails the whole batch.
pub async fn extract_notes(
    store: &dyn RecordStore,
    patients: Vec<Patient>,
    date: NaiveDate,
) -> WardResult<Vec<PatientNotes>> {
    let lookups = patients.into_iter().map(|patient| async move {
        let notes = store.list_notes_by_date(patient.id(), date).await?;
        WardResult::Ok(PatientNotes { patient, notes })
    });

    let rows = try_join_all(lookups).await?;
    Ok(rows.into_iter().filter(|row| !row.notes.is_empty()).collect())
}

/// Renders extracted rows as CSV: `Patient Name,MRN,Specialty,Notes`.
///
/// Each note is quoted with inner quotes doubled and the notes are joined with `; `.
pub fn to_csv(rows: &[PatientNotes]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for row in rows {
        let notes = row
            .notes
            .iter()
            .map(|n| quote(n.note.as_str()))
            .collect::<Vec<_>>()
            .join("; ");
        lines.push(format!(
            "{},{},{},{}",
            field(row.patient.name().as_str()),
            field(row.patient.mrn().as_str()),
            field(row.patient.specialty().as_str()),
            notes
        ));
    }

    lines.join("\n")
}

pub fn csv_filename(date: NaiveDate) -> String {
    format!("patient_data_{}.csv", date.format("%Y-%m-%d"))
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quote(value)
    } else {
        value.to_string()
    }
}
