//! Admission and discharge coordination.
//!
//! The `registry` module owns every ward and every patient the
//! hospital has seen.  It is the only place where a patient's status
//! and a ward's bed list change, and it changes them together: an
//! admitted patient holds exactly one bed in the ward they were
//! admitted to, a discharged patient holds none.  Each operation
//! either applies completely or returns an error with nothing touched.

use crate::error::{HospitalError, HospitalResult};
use crate::models::{today, Patient, PatientHandle, PatientRecord, PatientStatus};
use crate::ward::{Ward, WardOccupancy};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Wards created at startup and their bed counts.
pub const DEFAULT_WARDS: [(&str, usize); 4] = [
    ("ICU", 5),
    ("General", 10),
    ("Pediatric", 8),
    ("Emergency", 3),
];

/// Patients currently in one ward, in bed allocation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WardAllocation {
    pub ward: String,
    pub patients: Vec<AllocatedPatient>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocatedPatient {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct HospitalRegistry {
    wards: BTreeMap<String, Ward>,
    patients: Vec<Patient>,
}

impl HospitalRegistry {
    /// Builds a registry with the given ward layout and no patients.
    pub fn new<'a>(layout: impl IntoIterator<Item = (&'a str, usize)>) -> HospitalResult<Self> {
        let mut wards = BTreeMap::new();
        for (name, beds) in layout {
            wards.insert(name.to_string(), Ward::new(name, beds)?);
        }
        Ok(Self {
            wards,
            patients: Vec::new(),
        })
    }

    /// Admits a new patient today.
    pub fn admit_patient(
        &mut self,
        id: &str,
        name: &str,
        age: i32,
        ward_name: &str,
    ) -> HospitalResult<&Patient> {
        self.admit_patient_on(id, name, age, ward_name, today())
    }

    /// Admits a new patient on `date`.
    ///
    /// The ward is checked first, then the patient is built, then a bed
    /// is allocated; the patient is only recorded once all three pass.
    pub fn admit_patient_on(
        &mut self,
        id: &str,
        name: &str,
        age: i32,
        ward_name: &str,
        date: NaiveDate,
    ) -> HospitalResult<&Patient> {
        let ward = self
            .wards
            .get_mut(ward_name)
            .ok_or_else(|| HospitalError::InvalidWard(ward_name.to_string()))?;
        let patient = Patient::new(id, name, age, ward_name, date)?;
        let handle = PatientHandle(self.patients.len());
        ward.add_patient(handle)?;
        info!(patient = %patient.id(), ward = %ward_name, "patient admitted");
        self.patients.push(patient);
        Ok(&self.patients[handle.0])
    }

    /// Discharges the first patient with `id`, today.
    pub fn discharge_patient(&mut self, id: &str) -> HospitalResult<&Patient> {
        self.discharge_patient_on(id, today())
    }

    /// Discharges the first patient with `id` on `date` and frees their
    /// bed.  The bed is only released once the patient has accepted the
    /// discharge.
    pub fn discharge_patient_on(&mut self, id: &str, date: NaiveDate) -> HospitalResult<&Patient> {
        let index = self
            .patients
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| HospitalError::PatientNotFound(id.to_string()))?;
        let patient = &mut self.patients[index];
        patient.discharge(date)?;
        if let Some(ward) = self.wards.get_mut(patient.ward()) {
            ward.remove_patient(PatientHandle(index));
        }
        info!(patient = %id, ward = %patient.ward(), "patient discharged");
        Ok(&self.patients[index])
    }

    /// Replays a persisted record.  Admitted records need a free bed in
    /// their ward; discharged ones are history and take no bed.
    pub fn restore_patient(&mut self, record: &PatientRecord, today: NaiveDate) -> HospitalResult<()> {
        let ward = self
            .wards
            .get_mut(&record.ward)
            .ok_or_else(|| HospitalError::InvalidWard(record.ward.clone()))?;
        let patient = Patient::from_record(record, today)?;
        let handle = PatientHandle(self.patients.len());
        if record.status == PatientStatus::Admitted {
            ward.add_patient(handle)?;
        }
        self.patients.push(patient);
        Ok(())
    }

    /// Every patient ever recorded, in admission order.
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn find_patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id() == id)
    }

    pub fn patient(&self, handle: PatientHandle) -> Option<&Patient> {
        self.patients.get(handle.0)
    }

    pub fn ward(&self, name: &str) -> Option<&Ward> {
        self.wards.get(name)
    }

    pub fn wards(&self) -> impl Iterator<Item = &Ward> {
        self.wards.values()
    }

    pub fn ward_names(&self) -> impl Iterator<Item = &str> {
        self.wards.keys().map(String::as_str)
    }

    pub fn ward_occupancy(&self) -> Vec<WardOccupancy> {
        self.wards.values().map(Ward::occupancy).collect()
    }

    pub fn ward_allocations(&self) -> Vec<WardAllocation> {
        self.wards
            .values()
            .map(|ward| WardAllocation {
                ward: ward.name().to_string(),
                patients: ward
                    .occupants()
                    .iter()
                    .filter_map(|handle| self.patient(*handle))
                    .map(|p| AllocatedPatient {
                        id: p.id().to_string(),
                        name: p.name().to_string(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Ordered snapshot of all patients for persistence.
    pub fn snapshot(&self) -> Vec<PatientRecord> {
        self.patients.iter().map(Patient::record).collect()
    }
}
