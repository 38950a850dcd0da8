//! Constants used throughout the ward core crate.
//!
//! Path names, filenames and fixed note texts live here so that every layer agrees on them.

/// Default directory for patient data storage when no explicit directory is configured.
pub const DEFAULT_PATIENT_DATA_DIR: &str = "patient_data";

/// Directory name for patient records under the patient data directory.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Filename for the patient JSON record.
pub const PATIENT_JSON_FILENAME: &str = "patient.json";

/// Filename for a patient's medical note ledger.
pub const NOTES_JSON_FILENAME: &str = "notes.json";

/// Author recorded on notes written by the system itself (discharges).
pub const DEFAULT_SYSTEM_USER: &str = "System";

/// Author recorded on clinician notes until authentication exists.
pub const DEFAULT_NOTE_AUTHOR: &str = "Current User";

/// Discharge notes used when a discharge is requested by MRN.
pub const DISCHARGE_REQUESTED_NOTES: &str = "Discharge requested";

/// Prefix of the note appended on discharge.
pub const DISCHARGE_NOTE_PREFIX: &str = "Discharge notes: ";

/// Header row of the note extraction CSV.
pub const CSV_HEADER: &str = "Patient Name,MRN,Specialty,Notes";
