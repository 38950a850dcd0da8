//! Medical notes: the append-only, per-patient ledger.

use crate::constants::DEFAULT_NOTE_AUTHOR;
use crate::{FreeText, NonEmptyText, RecordId, WardError, WardResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A note as held by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalNote {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub date: DateTime<Utc>,
    pub note: FreeText,
    pub user: NonEmptyText,
}

impl MedicalNote {
    /// True when the note was written on `day` (UTC calendar day).
    pub fn is_on(&self, day: NaiveDate) -> bool {
        self.date.date_naive() == day
    }
}

/// A validated note waiting for a store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub patient_id: RecordId,
    pub date: DateTime<Utc>,
    pub note: FreeText,
    pub user: NonEmptyText,
}

impl NewNote {
    pub fn into_note(self, id: RecordId) -> MedicalNote {
        MedicalNote {
            id,
            patient_id: self.patient_id,
            date: self.date,
            note: self.note,
            user: self.user,
        }
    }
}

/// Raw note input. Missing `date` means now; missing `user` means the placeholder author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub patient_id: RecordId,
    pub note: String,
    pub user: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl NoteDraft {
    pub fn new(patient_id: RecordId, note: impl Into<String>) -> Self {
        Self {
            patient_id,
            note: note.into(),
            user: None,
            date: None,
        }
    }

    pub fn by(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn at(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// # Errors
    ///
    /// Returns [`WardError::Validation`] if the note text is blank.
    pub fn validate(self, now: DateTime<Utc>) -> WardResult<NewNote> {
        let note = FreeText::new(self.note)
            .map_err(|_| WardError::validation("note text is required"))?;
        let user = match self.user.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() => NonEmptyText::new(user),
            _ => NonEmptyText::new(DEFAULT_NOTE_AUTHOR),
        }
        .map_err(|_| WardError::validation("note author is required"))?;

        Ok(NewNote {
            patient_id: self.patient_id,
            date: self.date.unwrap_or(now),
            note,
            user,
        })
    }
}

/// Notes of `notes` written on `day`, keeping their order.
pub fn notes_on(notes: Vec<MedicalNote>, day: NaiveDate) -> Vec<MedicalNote> {
    notes.into_iter().filter(|n| n.is_on(day)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn draft_defaults_author_and_date() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        let note = NoteDraft::new(RecordId::new(), "Afebrile overnight")
            .validate(now)
            .unwrap();

        assert_eq!(note.user.as_str(), "Current User");
        assert_eq!(note.date, now);
        assert_eq!(note.note.as_str(), "Afebrile overnight");
    }

    #[test]
    fn draft_keeps_explicit_author_and_date() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        let written = Utc.with_ymd_and_hms(2024, 1, 4, 23, 15, 0).unwrap();
        let note = NoteDraft::new(RecordId::new(), "Reviewed bloods")
            .by("Dr Mensah")
            .at(written)
            .validate(now)
            .unwrap();

        assert_eq!(note.user.as_str(), "Dr Mensah");
        assert_eq!(note.date, written);
    }

    #[test]
    fn note_text_is_stored_verbatim() {
        let text = "  - BP 120/80\n  - HR 70\n";
        let note = NoteDraft::new(RecordId::new(), text)
            .validate(Utc::now())
            .unwrap();
        assert_eq!(note.note.as_str(), text);
    }

    #[test]
    fn blank_note_is_rejected() {
        let err = NoteDraft::new(RecordId::new(), "  \n ")
            .validate(Utc::now())
            .unwrap_err();
        assert!(matches!(err, WardError::Validation(_)));
    }

    #[test]
    fn notes_on_filters_by_calendar_day() {
        let patient_id = RecordId::new();
        let make = |d: u32, h: u32| {
            NoteDraft::new(patient_id, format!("note {} {}", d, h))
                .at(Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap())
                .validate(Utc::now())
                .unwrap()
                .into_note(RecordId::new())
        };
        let notes = vec![make(5, 0), make(6, 12), make(5, 23)];

        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let on_day = notes_on(notes, day);

        assert_eq!(on_day.len(), 2);
        assert_eq!(on_day[0].note.as_str(), "note 5 0");
        assert_eq!(on_day[1].note.as_str(), "note 5 23");
    }
}
