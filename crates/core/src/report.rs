//! Daily specialty census.
//!
//! Reports are derived from the current patient collection on every request and never
//! stored.

use crate::{Patient, PatientStatus, Specialty};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Patients of one specialty, split by status. Input order is kept within each list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpecialtyCensus {
    pub active_patients: Vec<Patient>,
    pub discharged_patients: Vec<Patient>,
}

impl SpecialtyCensus {
    pub fn total(&self) -> usize {
        self.active_patients.len() + self.discharged_patients.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub date: DateTime<Utc>,
    /// Always holds an entry for each of the seven specialties.
    pub specialties: BTreeMap<Specialty, SpecialtyCensus>,
}

impl DailyReport {
    /// Buckets `patients` by specialty and status in a single pass.
    pub fn generate(patients: &[Patient], date: DateTime<Utc>) -> Self {
        let mut specialties: BTreeMap<Specialty, SpecialtyCensus> = Specialty::ALL
            .into_iter()
            .map(|s| (s, SpecialtyCensus::default()))
            .collect();

        for patient in patients {
            let census = specialties.entry(patient.specialty()).or_default();
            match patient.status() {
                PatientStatus::Active => census.active_patients.push(patient.clone()),
                PatientStatus::Discharged => census.discharged_patients.push(patient.clone()),
            }
        }

        Self { date, specialties }
    }

    pub fn census(&self, specialty: Specialty) -> &SpecialtyCensus {
        // `generate` seeds every specialty.
        &self.specialties[&specialty]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::tests::form;
    use crate::{PatientUpdate, RecordId};
    use chrono::Duration;
    use std::collections::HashSet;

    fn patient(name: &str, specialty: Specialty, discharged: bool) -> Patient {
        let admitted = Utc::now() - Duration::days(2);
        let mut p = form(name, name, specialty)
            .validate(admitted)
            .unwrap()
            .into_patient(RecordId::new());
        if discharged {
            p.apply(&PatientUpdate::discharge(Utc::now())).unwrap();
        }
        p
    }

    #[test]
    fn empty_collection_still_lists_every_specialty() {
        let report = DailyReport::generate(&[], Utc::now());

        assert_eq!(report.specialties.len(), Specialty::ALL.len());
        assert!(report.specialties.values().all(|c| c.total() == 0));
    }

    #[test]
    fn buckets_partition_the_input() {
        let patients = vec![
            patient("a", Specialty::Hematology, false),
            patient("b", Specialty::Hematology, true),
            patient("c", Specialty::Neurology, false),
            patient("d", Specialty::Endocrinology, true),
            patient("e", Specialty::Hematology, false),
        ];

        let report = DailyReport::generate(&patients, Utc::now());

        let bucketed: Vec<RecordId> = report
            .specialties
            .values()
            .flat_map(|c| c.active_patients.iter().chain(&c.discharged_patients))
            .map(Patient::id)
            .collect();
        assert_eq!(bucketed.len(), patients.len(), "no duplicates or omissions");
        let unique: HashSet<RecordId> = bucketed.into_iter().collect();
        let input: HashSet<RecordId> = patients.iter().map(Patient::id).collect();
        assert_eq!(unique, input);

        let hematology = report.census(Specialty::Hematology);
        let active: Vec<&str> = hematology
            .active_patients
            .iter()
            .map(|p| p.name().as_str())
            .collect();
        assert_eq!(active, vec!["a", "e"], "input order is kept");
        assert_eq!(hematology.discharged_patients.len(), 1);
    }

    #[test]
    fn discharged_patient_moves_between_buckets() {
        let mut a = patient("A", Specialty::Hematology, false);

        let before = DailyReport::generate(std::slice::from_ref(&a), Utc::now());
        assert_eq!(before.census(Specialty::Hematology).active_patients, vec![a.clone()]);

        a.apply(&PatientUpdate::discharge(Utc::now())).unwrap();
        let after = DailyReport::generate(std::slice::from_ref(&a), Utc::now());
        let census = after.census(Specialty::Hematology);
        assert!(census.active_patients.is_empty());
        assert_eq!(census.discharged_patients, vec![a]);
    }

    #[test]
    fn report_serialises_specialty_names() {
        let report = DailyReport::generate(&[], Utc::now());
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["specialties"]["General Internal Medicine"]["active_patients"].is_array());
        assert!(json["specialties"]["Infectious Diseases"].is_object());
    }
}
