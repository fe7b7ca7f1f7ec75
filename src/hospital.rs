//! The hospital as a whole: registry, billing and the files behind them.
//!
//! Both the interactive menu and the HTTP API drive a [`Hospital`].
//! Domain operations return [`HospitalResult`]; persisting after an
//! admission or discharge is best effort and a failure to write is
//! logged rather than undoing the change, so the two kinds of failure
//! never mix.

use crate::billing::{Bill, BillingService};
use crate::error::{HospitalError, HospitalResult};
use crate::models::{today, PatientRecord};
use crate::registry::{HospitalRegistry, WardAllocation};
use crate::store::{Store, StoreError};
use crate::ward::WardOccupancy;
use tracing::{error, info, warn};

pub struct Hospital {
    registry: HospitalRegistry,
    billing: BillingService,
    store: Store,
}

impl Hospital {
    pub fn new(registry: HospitalRegistry, billing: BillingService, store: Store) -> Self {
        Self {
            registry,
            billing,
            store,
        }
    }

    /// Loads patients and rates from `store` into `registry` and
    /// `billing`.  Records that no longer fit (unknown ward, full ward,
    /// bad data) are skipped with a warning.
    pub fn open(
        mut registry: HospitalRegistry,
        mut billing: BillingService,
        store: Store,
    ) -> Result<Self, StoreError> {
        let now = today();
        for record in store.load_patients()? {
            if let Err(err) = registry.restore_patient(&record, now) {
                warn!(patient = %record.id, %err, "skipping stored patient");
            }
        }
        for (ward, rate) in store.load_rates()? {
            if let Err(err) = billing.set_ward_rate(&ward, rate) {
                warn!(%ward, %err, "skipping stored rate");
            }
        }
        info!(
            patients = registry.patients().len(),
            data_dir = %store.data_dir().display(),
            "hospital opened"
        );
        Ok(Self::new(registry, billing, store))
    }

    pub fn registry(&self) -> &HospitalRegistry {
        &self.registry
    }

    pub fn billing(&self) -> &BillingService {
        &self.billing
    }

    pub fn admit(&mut self, id: &str, name: &str, age: i32, ward: &str) -> HospitalResult<PatientRecord> {
        let record = self.registry.admit_patient(id, name, age, ward)?.record();
        self.persist_patients();
        Ok(record)
    }

    pub fn discharge(&mut self, id: &str) -> HospitalResult<PatientRecord> {
        let record = self.registry.discharge_patient(id)?.record();
        self.persist_patients();
        Ok(record)
    }

    pub fn patients(&self) -> Vec<PatientRecord> {
        self.registry.snapshot()
    }

    pub fn occupancy(&self) -> Vec<WardOccupancy> {
        self.registry.ward_occupancy()
    }

    pub fn allocations(&self) -> Vec<WardAllocation> {
        self.registry.ward_allocations()
    }

    pub fn apply_discount(&mut self, percentage: f64) -> HospitalResult<()> {
        self.billing.apply_discount(percentage)
    }

    /// Bills for all discharged patients, in admission order.
    pub fn billing_report(&self) -> Vec<Bill> {
        self.billing.generate_report(self.registry.patients())
    }

    /// Bill for one patient; `Ok(None)` while they are still admitted.
    pub fn bill_for(&self, id: &str) -> HospitalResult<Option<Bill>> {
        let patient = self
            .registry
            .find_patient(id)
            .ok_or_else(|| HospitalError::PatientNotFound(id.to_string()))?;
        Ok(self.billing.calculate_bill(patient))
    }

    pub fn save_billing_report(&self) -> Result<(), StoreError> {
        self.store
            .save_billing_report(self.registry.patients(), &self.billing)
    }

    /// Writes patients and rates back to the data directory.
    pub fn save(&self) -> Result<(), StoreError> {
        self.store.save_patients(&self.registry.snapshot())?;
        self.store.save_rates(self.billing.rates())
    }

    fn persist_patients(&self) {
        if let Err(err) = self.store.save_patients(&self.registry.snapshot()) {
            error!(%err, "failed to save patients");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_WARDS;

    fn open(dir: &std::path::Path) -> Hospital {
        Hospital::open(
            HospitalRegistry::new(DEFAULT_WARDS).unwrap(),
            BillingService::new(),
            Store::new(dir),
        )
        .unwrap()
    }

    #[test]
    fn test_admissions_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut hospital = open(dir.path());
        hospital.admit("P001", "Asha", 40, "ICU").unwrap();
        hospital.admit("P002", "Ravi", 12, "Pediatric").unwrap();
        hospital.discharge("P002").unwrap();

        let reopened = open(dir.path());
        assert_eq!(reopened.patients(), hospital.patients());
        assert_eq!(reopened.registry().ward("ICU").unwrap().occupied(), 1);
        let report = reopened.billing_report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].patient_id, "P002");
    }

    #[test]
    fn test_failed_admission_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut hospital = open(dir.path());
        assert!(hospital.admit("P001", "Asha", 40, "Nowhere").is_err());
        assert!(!Store::new(dir.path()).patients_path().exists());
    }

    #[test]
    fn test_bill_for_patient() {
        let dir = tempfile::tempdir().unwrap();
        let mut hospital = open(dir.path());
        hospital.admit("P001", "Asha", 40, "General").unwrap();
        assert_eq!(hospital.bill_for("P001").unwrap(), None);
        hospital.discharge("P001").unwrap();
        hospital.apply_discount(50.0).unwrap();
        let bill = hospital.bill_for("P001").unwrap().unwrap();
        assert_eq!(bill.final_amount, 1000.0);
        assert_eq!(
            hospital.bill_for("P404").unwrap_err(),
            HospitalError::PatientNotFound("P404".into())
        );
    }

    #[test]
    fn test_stored_rates_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(crate::store::RATES_FILE), "ICU=9000\nGeneral=-5\n").unwrap();
        let hospital = open(dir.path());
        assert_eq!(hospital.billing().rate("ICU"), 9000.0);
        assert_eq!(hospital.billing().rate("General"), 2000.0);
    }
}
