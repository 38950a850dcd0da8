//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Request handling never reads process-wide environment variables; binaries read them and
//! hand the values to the parsing helpers in this module.

use crate::constants::{DEFAULT_PATIENT_DATA_DIR, DEFAULT_SYSTEM_USER, PATIENTS_DIR_NAME};
use crate::{NonEmptyText, WardError, WardResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which record store adapter backs the ward service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// JSON files under the patient data directory.
    #[default]
    File,
    /// Process-local store; contents are lost on exit.
    Memory,
}

impl FromStr for StoreKind {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(WardError::InvalidConfig(format!(
                "unknown store kind '{}' (expected 'file' or 'memory')",
                other
            ))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_dir: PathBuf,
    store_kind: StoreKind,
    system_user: NonEmptyText,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`WardError::InvalidConfig`] if the file store is selected and the patient data
    /// directory path is empty.
    pub fn new(
        patient_data_dir: PathBuf,
        store_kind: StoreKind,
        system_user: NonEmptyText,
    ) -> WardResult<Self> {
        if store_kind == StoreKind::File && patient_data_dir.as_os_str().is_empty() {
            return Err(WardError::InvalidConfig(
                "patient data directory cannot be empty".into(),
            ));
        }

        Ok(Self {
            patient_data_dir,
            store_kind,
            system_user,
        })
    }

    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.patient_data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store_kind
    }

    /// Author identity recorded on system-generated notes.
    pub fn system_user(&self) -> &NonEmptyText {
        &self.system_user
    }
}

/// Resolve the patient data directory from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_PATIENT_DATA_DIR`].
pub fn patient_data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PATIENT_DATA_DIR))
}

/// Parse the store kind from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`StoreKind::File`].
pub fn store_kind_from_env_value(value: Option<String>) -> WardResult<StoreKind> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<StoreKind>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Parse the system note author from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_SYSTEM_USER`].
pub fn system_user_from_env_value(value: Option<String>) -> WardResult<NonEmptyText> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_SYSTEM_USER.to_string());

    NonEmptyText::new(value)
        .map_err(|e| WardError::InvalidConfig(format!("system user: {}", e)))
}
