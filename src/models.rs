//! Data models for the Ward Engine.
//!
//! The `models` module defines the people the hospital tracks and the
//! admission lifecycle of a patient.  A [`Patient`] embeds a
//! [`Person`] rather than extending it, and owns the only state
//! transition in the system: admitted to discharged.  The serialisable
//! [`PatientRecord`] is the flat snapshot handed to persistence and to
//! the HTTP surface.

use crate::error::{HospitalError, HospitalResult};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Oldest age accepted on admission.
pub const MAX_AGE: i32 = 150;

/// Today's calendar date in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Identity shared by everyone the hospital records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    /// Identifier such as `"P001"`.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Age in years, `0..=150`.
    pub age: u8,
}

impl Person {
    /// Validates and builds a person.  Identifiers and names end up as
    /// fields of a comma separated line, so they may not be blank or
    /// carry separators.
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: i32) -> HospitalResult<Self> {
        let id = id.into().trim().to_string();
        let name = name.into().trim().to_string();
        if !is_plain_field(&id) {
            return Err(HospitalError::invalid_data("ID", id));
        }
        if !is_plain_field(&name) {
            return Err(HospitalError::invalid_data("Name", name));
        }
        if !(0..=MAX_AGE).contains(&age) {
            return Err(HospitalError::invalid_data("Age", age));
        }
        Ok(Self {
            id,
            name,
            age: age as u8,
        })
    }
}

fn is_plain_field(value: &str) -> bool {
    !value.is_empty() && !value.contains([',', '\n', '\r'])
}

/// Where a patient is in the admission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    /// Occupies a bed in their ward.
    Admitted,
    /// Left the hospital; terminal.
    Discharged,
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientStatus::Admitted => f.write_str("admitted"),
            PatientStatus::Discharged => f.write_str("discharged"),
        }
    }
}

impl FromStr for PatientStatus {
    type Err = HospitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admitted" => Ok(PatientStatus::Admitted),
            "discharged" => Ok(PatientStatus::Discharged),
            _ => Err(HospitalError::invalid_data("Status", s.trim())),
        }
    }
}

/// A patient and their stay.
///
/// The status is derived from the discharge date, so "discharged" and
/// "has a discharge date" can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    person: Person,
    ward: String,
    admit_date: NaiveDate,
    discharge_date: Option<NaiveDate>,
}

impl Patient {
    /// Creates an admitted patient.  Fails with
    /// [`HospitalError::InvalidPatientData`] when the age is outside
    /// `0..=150` or the id/name are unusable.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        age: i32,
        ward: impl Into<String>,
        admit_date: NaiveDate,
    ) -> HospitalResult<Self> {
        Ok(Self {
            person: Person::new(id, name, age)?,
            ward: ward.into(),
            admit_date,
            discharge_date: None,
        })
    }

    /// Rebuilds a patient from a persisted record.  Records admitted
    /// after `today` are rejected, since they could never be discharged.
    /// Discharged records without a stored discharge date are closed on
    /// `today`.
    pub fn from_record(record: &PatientRecord, today: NaiveDate) -> HospitalResult<Self> {
        if record.admit_date > today {
            return Err(HospitalError::invalid_data("AdmitDate", record.admit_date));
        }
        let mut patient = Self::new(
            record.id.as_str(),
            record.name.as_str(),
            i32::from(record.age),
            record.ward.as_str(),
            record.admit_date,
        )?;
        if record.status == PatientStatus::Discharged {
            patient.discharge(record.discharge_date.unwrap_or(today))?;
        }
        Ok(patient)
    }

    pub fn person(&self) -> &Person {
        &self.person
    }

    pub fn id(&self) -> &str {
        &self.person.id
    }

    pub fn name(&self) -> &str {
        &self.person.name
    }

    pub fn age(&self) -> u8 {
        self.person.age
    }

    pub fn ward(&self) -> &str {
        &self.ward
    }

    pub fn admit_date(&self) -> NaiveDate {
        self.admit_date
    }

    pub fn discharge_date(&self) -> Option<NaiveDate> {
        self.discharge_date
    }

    pub fn status(&self) -> PatientStatus {
        match self.discharge_date {
            Some(_) => PatientStatus::Discharged,
            None => PatientStatus::Admitted,
        }
    }

    pub fn is_discharged(&self) -> bool {
        self.discharge_date.is_some()
    }

    /// Ends the stay on `date`.
    ///
    /// A second discharge fails with [`HospitalError::AlreadyDischarged`]
    /// and leaves the original date in place.  A date before admission
    /// is rejected as invalid data.
    pub fn discharge(&mut self, date: NaiveDate) -> HospitalResult<()> {
        if self.is_discharged() {
            return Err(HospitalError::AlreadyDischarged {
                id: self.person.id.clone(),
                name: self.person.name.clone(),
            });
        }
        if date < self.admit_date {
            return Err(HospitalError::invalid_data("DischargeDate", date));
        }
        self.discharge_date = Some(date);
        Ok(())
    }

    /// Inclusive number of days in hospital, counting up to today while
    /// the patient is still admitted.
    pub fn days_admitted(&self) -> i64 {
        self.days_admitted_as_of(today())
    }

    /// Inclusive day count with an explicit "today".  A same-day stay
    /// counts as one day.
    pub fn days_admitted_as_of(&self, today: NaiveDate) -> i64 {
        let end = self.discharge_date.unwrap_or(today);
        ((end - self.admit_date).num_days() + 1).max(1)
    }

    /// Flat snapshot for persistence and reporting.
    pub fn record(&self) -> PatientRecord {
        PatientRecord {
            id: self.person.id.clone(),
            name: self.person.name.clone(),
            age: self.person.age,
            ward: self.ward.clone(),
            admit_date: self.admit_date,
            status: self.status(),
            discharge_date: self.discharge_date,
        }
    }
}

/// Serialisable view of a patient, one per line of `patients.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    /// Patient identifier, e.g. `"P001"`.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Age in years at admission.
    pub age: u8,
    /// Name of the ward the patient was admitted to.
    pub ward: String,
    /// Calendar date of admission.
    pub admit_date: NaiveDate,
    /// Lifecycle state; `discharged` exactly when `discharge_date` is set.
    pub status: PatientStatus,
    /// Calendar date the stay ended, if it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discharge_date: Option<NaiveDate>,
}

/// Stable reference to a patient inside the registry.  Patients are
/// never removed, so the position in the registry's list stays valid
/// for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatientHandle(pub(crate) usize);

impl PatientHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_out_of_range_is_rejected() {
        let err = Patient::new("P001", "Asha", 200, "ICU", date(2024, 3, 1)).unwrap_err();
        assert_eq!(
            err,
            HospitalError::InvalidPatientData {
                field: "Age".into(),
                value: "200".into()
            }
        );
        assert!(Patient::new("P001", "Asha", -1, "ICU", date(2024, 3, 1)).is_err());
        assert!(Patient::new("P001", "Asha", 150, "ICU", date(2024, 3, 1)).is_ok());
        assert!(Patient::new("P001", "Asha", 0, "ICU", date(2024, 3, 1)).is_ok());
    }

    #[test]
    fn test_name_with_separator_is_rejected() {
        let err = Patient::new("P001", "Doe, Jane", 30, "ICU", date(2024, 3, 1)).unwrap_err();
        assert!(matches!(err, HospitalError::InvalidPatientData { ref field, .. } if field == "Name"));
        assert!(Patient::new("  ", "Jane", 30, "ICU", date(2024, 3, 1)).is_err());
    }

    #[test]
    fn test_new_patient_is_admitted() {
        let patient = Patient::new("P001", "Asha", 40, "ICU", date(2024, 3, 1)).unwrap();
        assert_eq!(patient.status(), PatientStatus::Admitted);
        assert_eq!(patient.discharge_date(), None);
    }

    #[test]
    fn test_same_day_stay_counts_one_day() {
        let patient = Patient::new("P001", "Asha", 40, "ICU", today()).unwrap();
        assert_eq!(patient.days_admitted(), 1);
    }

    #[test]
    fn test_days_admitted_is_inclusive() {
        let mut patient = Patient::new("P001", "Asha", 40, "ICU", date(2024, 3, 1)).unwrap();
        assert_eq!(patient.days_admitted_as_of(date(2024, 3, 2)), 2);
        patient.discharge(date(2024, 3, 4)).unwrap();
        assert_eq!(patient.days_admitted(), 4);
        // The discharge date wins over any later "today".
        assert_eq!(patient.days_admitted_as_of(date(2025, 1, 1)), 4);
    }

    #[test]
    fn test_double_discharge_keeps_first_date() {
        let mut patient = Patient::new("P001", "Asha", 40, "ICU", date(2024, 3, 1)).unwrap();
        patient.discharge(date(2024, 3, 2)).unwrap();
        let err = patient.discharge(date(2024, 3, 9)).unwrap_err();
        assert_eq!(
            err,
            HospitalError::AlreadyDischarged {
                id: "P001".into(),
                name: "Asha".into()
            }
        );
        assert_eq!(patient.discharge_date(), Some(date(2024, 3, 2)));
        assert_eq!(patient.status(), PatientStatus::Discharged);
    }

    #[test]
    fn test_discharge_before_admission_is_rejected() {
        let mut patient = Patient::new("P001", "Asha", 40, "ICU", date(2024, 3, 5)).unwrap();
        assert!(patient.discharge(date(2024, 3, 4)).is_err());
        assert!(!patient.is_discharged());
    }

    fn record(status: PatientStatus, admit_date: NaiveDate) -> PatientRecord {
        PatientRecord {
            id: "P002".into(),
            name: "Ravi".into(),
            age: 12,
            ward: "Pediatric".into(),
            admit_date,
            status,
            discharge_date: None,
        }
    }

    #[test]
    fn test_from_record_without_discharge_date_closes_today() {
        let record = record(PatientStatus::Discharged, date(2024, 6, 1));
        let patient = Patient::from_record(&record, date(2024, 6, 10)).unwrap();
        assert_eq!(patient.discharge_date(), Some(date(2024, 6, 10)));
        assert_eq!(patient.record().status, PatientStatus::Discharged);
    }

    #[test]
    fn test_from_record_admitted_in_the_future_is_rejected() {
        let now = date(2024, 6, 1);
        for status in [PatientStatus::Admitted, PatientStatus::Discharged] {
            let err = Patient::from_record(&record(status, date(2024, 7, 1)), now).unwrap_err();
            assert_eq!(err, HospitalError::invalid_data("AdmitDate", "2024-07-01"));
        }
        assert!(Patient::from_record(&record(PatientStatus::Admitted, now), now).is_ok());
    }

    #[test]
    fn test_status_parses_case_insensitively() {
        assert_eq!("Discharged".parse::<PatientStatus>().unwrap(), PatientStatus::Discharged);
        assert_eq!(" admitted ".parse::<PatientStatus>().unwrap(), PatientStatus::Admitted);
        assert!("gone".parse::<PatientStatus>().is_err());
    }
}
