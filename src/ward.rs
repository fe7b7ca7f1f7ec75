//! Fixed-capacity bed pools.

use crate::error::{HospitalError, HospitalResult};
use crate::models::PatientHandle;
use serde::Serialize;
use tracing::debug;

/// A named ward holding the patients currently in its beds.
#[derive(Debug, Clone)]
pub struct Ward {
    name: String,
    total_beds: usize,
    occupants: Vec<PatientHandle>,
}

/// Bed usage of one ward at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WardOccupancy {
    /// Ward name.
    pub ward: String,
    /// Fixed bed capacity.
    pub total_beds: usize,
    /// Beds held by admitted patients.
    pub occupied: usize,
    /// Beds still free.
    pub available: usize,
    /// `occupied` as a share of `total_beds`, from 0 to 100.
    pub occupancy_percentage: f64,
}

impl Ward {
    /// Creates an empty ward.  A ward without beds is rejected.
    pub fn new(name: impl Into<String>, total_beds: usize) -> HospitalResult<Self> {
        let name = name.into();
        if total_beds == 0 {
            return Err(HospitalError::InvalidWardCapacity(name));
        }
        Ok(Self {
            name,
            total_beds,
            occupants: Vec::with_capacity(total_beds),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_beds(&self) -> usize {
        self.total_beds
    }

    /// Occupants in the order their beds were allocated.
    pub fn occupants(&self) -> &[PatientHandle] {
        &self.occupants
    }

    pub fn occupied(&self) -> usize {
        self.occupants.len()
    }

    pub fn available_beds(&self) -> usize {
        self.total_beds - self.occupants.len()
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= self.total_beds
    }

    pub fn contains(&self, patient: PatientHandle) -> bool {
        self.occupants.contains(&patient)
    }

    pub fn occupancy_percentage(&self) -> f64 {
        self.occupants.len() as f64 * 100.0 / self.total_beds as f64
    }

    pub fn occupancy(&self) -> WardOccupancy {
        WardOccupancy {
            ward: self.name.clone(),
            total_beds: self.total_beds,
            occupied: self.occupied(),
            available: self.available_beds(),
            occupancy_percentage: self.occupancy_percentage(),
        }
    }

    /// Allocates a bed, failing with [`HospitalError::NoBedsAvailable`]
    /// when every bed is taken.  A failed call leaves the ward as it was.
    pub fn add_patient(&mut self, patient: PatientHandle) -> HospitalResult<()> {
        if self.is_full() {
            return Err(HospitalError::NoBedsAvailable {
                ward: self.name.clone(),
                total: self.total_beds,
                occupied: self.occupants.len(),
            });
        }
        self.occupants.push(patient);
        debug!(ward = %self.name, occupied = self.occupants.len(), "bed allocated");
        Ok(())
    }

    /// Releases the patient's bed.  Releasing a patient who holds no
    /// bed here does nothing; the return value says whether a bed was
    /// freed.
    pub fn remove_patient(&mut self, patient: PatientHandle) -> bool {
        match self.occupants.iter().position(|p| *p == patient) {
            Some(index) => {
                self.occupants.remove(index);
                debug!(ward = %self.name, occupied = self.occupants.len(), "bed released");
                true
            }
            None => false,
        }
    }
}
