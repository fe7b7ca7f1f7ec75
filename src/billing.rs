//! Ward rates and patient bills.
//!
//! The `billing` module keeps the daily rate charged by each ward and
//! the discount currently on offer, and turns discharged patients into
//! [`Bill`]s.  It never owns patients; callers pass the registry's list
//! in by reference.

use crate::error::{HospitalError, HospitalResult};
use crate::models::Patient;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Daily rates applied when no rate file overrides them.
pub const DEFAULT_RATES: [(&str, f64); 4] = [
    ("ICU", 5000.0),
    ("General", 2000.0),
    ("Pediatric", 2500.0),
    ("Emergency", 8000.0),
];

/// The charge for one discharged patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bill {
    /// Identifier of the billed patient.
    pub patient_id: String,
    /// Name of the billed patient.
    pub patient_name: String,
    /// Ward whose rate was charged.
    pub ward: String,
    /// Rate per day for that ward; zero when the ward has no rate.
    pub daily_rate: f64,
    /// Inclusive length of the stay in days.
    pub days_admitted: i64,
    /// Rate times days, before discount.
    pub total: f64,
    /// Discount in effect when the bill was computed, `0..=100`.
    pub discount_percentage: f64,
    /// Amount taken off `total`.
    pub discount: f64,
    /// What the patient owes: `total - discount`.
    pub final_amount: f64,
}

#[derive(Debug, Clone)]
pub struct BillingService {
    discount_percentage: f64,
    ward_rates: BTreeMap<String, f64>,
}

impl Default for BillingService {
    fn default() -> Self {
        Self {
            discount_percentage: 0.0,
            ward_rates: DEFAULT_RATES
                .iter()
                .map(|(ward, rate)| (ward.to_string(), *rate))
                .collect(),
        }
    }
}

impl BillingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discount_percentage(&self) -> f64 {
        self.discount_percentage
    }

    pub fn rates(&self) -> &BTreeMap<String, f64> {
        &self.ward_rates
    }

    /// Daily rate for `ward`; wards without a rate are free.
    pub fn rate(&self, ward: &str) -> f64 {
        self.ward_rates.get(ward).copied().unwrap_or(0.0)
    }

    /// Sets the daily rate of a ward.  Rates must be finite and not
    /// negative.
    pub fn set_ward_rate(&mut self, ward: &str, rate: f64) -> HospitalResult<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(HospitalError::invalid_data("Rate", rate));
        }
        self.ward_rates.insert(ward.to_string(), rate);
        Ok(())
    }

    /// Replaces the discount applied to every bill.
    pub fn apply_discount(&mut self, percentage: f64) -> HospitalResult<()> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(HospitalError::InvalidDiscount(percentage));
        }
        self.discount_percentage = percentage;
        info!(percentage, "discount applied");
        Ok(())
    }

    /// Bills a discharged patient.  Patients still in a bed get no bill.
    pub fn calculate_bill(&self, patient: &Patient) -> Option<Bill> {
        if !patient.is_discharged() {
            warn!(patient = %patient.id(), "patient is still admitted, no bill generated");
            return None;
        }
        let daily_rate = self.rate(patient.ward());
        let days_admitted = patient.days_admitted();
        let total = daily_rate * days_admitted as f64;
        let discount = total * (self.discount_percentage / 100.0);
        Some(Bill {
            patient_id: patient.id().to_string(),
            patient_name: patient.name().to_string(),
            ward: patient.ward().to_string(),
            daily_rate,
            days_admitted,
            total,
            discount_percentage: self.discount_percentage,
            discount,
            final_amount: total - discount,
        })
    }

    /// Bills for every discharged patient, in the order given.
    pub fn generate_report(&self, patients: &[Patient]) -> Vec<Bill> {
        patients
            .par_iter()
            .filter(|p| p.is_discharged())
            .filter_map(|p| self.calculate_bill(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn discharged(id: &str, ward: &str, days: u32) -> Patient {
        let mut patient = Patient::new(id, "Test", 30, ward, date(2024, 5, 1)).unwrap();
        patient.discharge(date(2024, 5, days)).unwrap();
        patient
    }

    #[test]
    fn test_discounted_icu_bill() {
        let mut billing = BillingService::new();
        billing.apply_discount(10.0).unwrap();
        let bill = billing.calculate_bill(&discharged("P1", "ICU", 4)).unwrap();
        assert_eq!(bill.daily_rate, 5000.0);
        assert_eq!(bill.days_admitted, 4);
        assert_eq!(bill.total, 20000.0);
        assert_eq!(bill.discount, 2000.0);
        assert_eq!(bill.final_amount, 18000.0);
    }

    #[test]
    fn test_admitted_patient_gets_no_bill() {
        let billing = BillingService::new();
        let patient = Patient::new("P1", "Test", 30, "ICU", date(2024, 5, 1)).unwrap();
        assert!(billing.calculate_bill(&patient).is_none());
        assert!(!patient.is_discharged());
    }

    #[test]
    fn test_unknown_ward_bills_nothing() {
        let billing = BillingService::new();
        let bill = billing.calculate_bill(&discharged("P1", "Annex", 3)).unwrap();
        assert_eq!(bill.final_amount, 0.0);
    }

    #[test]
    fn test_discount_out_of_range_is_rejected() {
        let mut billing = BillingService::new();
        billing.apply_discount(15.0).unwrap();
        assert_eq!(
            billing.apply_discount(120.0).unwrap_err(),
            HospitalError::InvalidDiscount(120.0)
        );
        assert!(billing.apply_discount(f64::NAN).is_err());
        assert_eq!(billing.discount_percentage(), 15.0);
    }

    #[test]
    fn test_negative_rate_is_rejected() {
        let mut billing = BillingService::new();
        assert!(billing.set_ward_rate("ICU", -1.0).is_err());
        billing.set_ward_rate("ICU", 6000.0).unwrap();
        assert_eq!(billing.rate("ICU"), 6000.0);
    }

    #[test]
    fn test_report_skips_admitted_and_keeps_order() {
        let billing = BillingService::new();
        let still_in = Patient::new("P2", "Test", 30, "General", date(2024, 5, 1)).unwrap();
        let patients = vec![
            discharged("P3", "General", 2),
            still_in,
            discharged("P1", "Emergency", 1),
        ];
        let report = billing.generate_report(&patients);
        let ids: Vec<&str> = report.iter().map(|b| b.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["P3", "P1"]);
        assert_eq!(report[0].final_amount, 4000.0);
        assert_eq!(report[1].final_amount, 8000.0);
    }
}
