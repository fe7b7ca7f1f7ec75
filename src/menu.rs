//! Interactive numbered menu.
//!
//! Reads choices and answers line by line from any [`BufRead`] and
//! writes prompts and results to any [`Write`], so a terminal session
//! and a scripted test go through the same code.  Running out of input
//! behaves like choosing "Exit": data is saved and the loop ends.

use crate::billing::Bill;
use crate::error::HospitalError;
use crate::hospital::Hospital;
use std::io::{self, BufRead, Write};

const RULE: &str = "==================================================";

pub fn run<R: BufRead, W: Write>(hospital: &mut Hospital, mut input: R, mut out: W) -> io::Result<()> {
    loop {
        print_menu(&mut out)?;
        let Some(choice) = read_line(&mut input)? else {
            return exit(hospital, &mut out);
        };
        match choice.parse::<u8>() {
            Ok(1) => admit(hospital, &mut input, &mut out)?,
            Ok(2) => {
                let Some(id) = prompt(&mut input, &mut out, "Enter Patient ID to discharge: ")? else {
                    continue;
                };
                match hospital.discharge(&id) {
                    Ok(record) => writeln!(out, "Patient {} discharged successfully.", record.name)?,
                    Err(err) => report_error(&mut out, &err)?,
                }
            }
            Ok(3) => list_patients(hospital, &mut out)?,
            Ok(4) => {
                writeln!(out, "\nWARD OCCUPANCY:")?;
                for ward in hospital.occupancy() {
                    writeln!(
                        out,
                        "Ward: {} | Beds: {}/{} | Available: {} | Occupancy: {:.1}%",
                        ward.ward, ward.occupied, ward.total_beds, ward.available, ward.occupancy_percentage
                    )?;
                }
            }
            Ok(5) => {
                writeln!(out, "\nWARD ALLOCATIONS:")?;
                for allocation in hospital.allocations() {
                    writeln!(out, "\n{} Ward:", allocation.ward)?;
                    if allocation.patients.is_empty() {
                        writeln!(out, "  (No patients)")?;
                    }
                    for patient in allocation.patients {
                        writeln!(out, "  - {} (ID: {})", patient.name, patient.id)?;
                    }
                }
            }
            Ok(6) => {
                let Some(value) = prompt(&mut input, &mut out, "Enter discount percentage (0-100): ")? else {
                    continue;
                };
                match value.parse::<f64>() {
                    Ok(percentage) => match hospital.apply_discount(percentage) {
                        Ok(()) => writeln!(out, "Discount applied: {percentage}%")?,
                        Err(err) => report_error(&mut out, &err)?,
                    },
                    Err(_) => writeln!(out, "Invalid input. Please enter a number.")?,
                }
            }
            Ok(7) => {
                writeln!(out, "\nBILLING REPORT FOR ALL PATIENTS")?;
                writeln!(out, "{RULE}")?;
                for bill in hospital.billing_report() {
                    writeln!(
                        out,
                        "{:<20} | Ward: {:<15} | Days: {} | Bill: {:.2}",
                        bill.patient_name, bill.ward, bill.days_admitted, bill.final_amount
                    )?;
                }
                writeln!(out, "{RULE}")?;
                if let Err(err) = hospital.save_billing_report() {
                    writeln!(out, "Error saving billing report: {err}")?;
                }
            }
            Ok(8) => {
                let Some(id) = prompt(&mut input, &mut out, "Enter Patient ID for billing: ")? else {
                    continue;
                };
                match hospital.bill_for(&id) {
                    Ok(Some(bill)) => print_statement(&mut out, &bill)?,
                    Ok(None) => writeln!(out, "Patient {id} is still admitted. Cannot generate bill.")?,
                    Err(err) => report_error(&mut out, &err)?,
                }
            }
            Ok(9) => return exit(hospital, &mut out),
            _ => writeln!(out, "Invalid choice. Please try again.")?,
        }
    }
}

fn print_menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "\n{RULE}")?;
    writeln!(out, " HOSPITAL PATIENT RECORD SYSTEM")?;
    writeln!(out, "{RULE}")?;
    for (number, label) in [
        "Admit Patient",
        "Discharge Patient",
        "List All Patients",
        "Show Ward Occupancy",
        "Show Ward Allocations",
        "Apply Discount",
        "Billing Report",
        "Billing for One Patient",
        "Exit (Save Data)",
    ]
    .iter()
    .enumerate()
    {
        writeln!(out, "{}. {label}", number + 1)?;
    }
    writeln!(out, "{RULE}")?;
    write!(out, "Choose an option (1-9): ")?;
    out.flush()
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> io::Result<Option<String>> {
    write!(out, "{question}")?;
    out.flush()?;
    read_line(input)
}

fn admit<R: BufRead, W: Write>(hospital: &mut Hospital, input: &mut R, out: &mut W) -> io::Result<()> {
    let Some(id) = prompt(input, out, "Enter Patient ID (e.g., P001): ")? else {
        return Ok(());
    };
    let Some(name) = prompt(input, out, "Enter Name: ")? else {
        return Ok(());
    };
    let Some(age) = prompt(input, out, "Enter Age: ")? else {
        return Ok(());
    };
    let Ok(age) = age.parse::<i32>() else {
        return writeln!(out, "Invalid input. Please enter a number.");
    };
    let wards: Vec<&str> = hospital.registry().ward_names().collect();
    writeln!(out, "Available Wards: {}", wards.join(", "))?;
    let Some(ward) = prompt(input, out, "Enter Ward: ")? else {
        return Ok(());
    };
    match hospital.admit(&id, &name, age, &ward) {
        Ok(record) => writeln!(out, "Patient {} admitted successfully!", record.name),
        Err(err) => report_error(out, &err),
    }
}

fn list_patients<W: Write>(hospital: &Hospital, out: &mut W) -> io::Result<()> {
    let patients = hospital.registry().patients();
    if patients.is_empty() {
        return writeln!(out, "No patients in the system");
    }
    writeln!(out, "\nALL PATIENTS:")?;
    for p in patients {
        writeln!(
            out,
            "ID: {} | Name: {} | Age: {} | Ward: {} | Status: {} | Days: {}",
            p.id(),
            p.name(),
            p.age(),
            p.ward(),
            p.status(),
            p.days_admitted()
        )?;
    }
    Ok(())
}

fn print_statement<W: Write>(out: &mut W, bill: &Bill) -> io::Result<()> {
    writeln!(out, "\nBILLING STATEMENT")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Patient: {} (ID: {})", bill.patient_name, bill.patient_id)?;
    writeln!(out, "Ward: {}", bill.ward)?;
    writeln!(out, "Daily Rate: {:.2}", bill.daily_rate)?;
    writeln!(out, "Days Admitted: {}", bill.days_admitted)?;
    writeln!(out, "Total Bill: {:.2}", bill.total)?;
    writeln!(out, "Discount ({}%): -{:.2}", bill.discount_percentage, bill.discount)?;
    writeln!(out, "Final Bill: {:.2}", bill.final_amount)?;
    writeln!(out, "{RULE}")
}

/// Prints the error with a hint where one helps.
fn report_error<W: Write>(out: &mut W, err: &HospitalError) -> io::Result<()> {
    writeln!(out, "Error: {err}")?;
    match err {
        HospitalError::NoBedsAvailable { total, occupied, .. } => writeln!(
            out,
            "Available beds: {}. Try another ward or come back later.",
            total - occupied
        ),
        HospitalError::InvalidPatientData { field, .. } => writeln!(out, "Field: {field}"),
        _ => Ok(()),
    }
}

fn exit<W: Write>(hospital: &Hospital, out: &mut W) -> io::Result<()> {
    writeln!(out, "\nSaving data...")?;
    match hospital.save() {
        Ok(()) => writeln!(out, "Goodbye!"),
        Err(err) => writeln!(out, "Error saving data: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::BillingService;
    use crate::registry::{HospitalRegistry, DEFAULT_WARDS};
    use crate::store::Store;
    use std::io::Cursor;

    fn session(dir: &std::path::Path, script: &str) -> (Hospital, String) {
        let mut hospital = Hospital::open(
            HospitalRegistry::new(DEFAULT_WARDS).unwrap(),
            BillingService::new(),
            Store::new(dir),
        )
        .unwrap();
        let mut out = Vec::new();
        run(&mut hospital, Cursor::new(script.to_string()), &mut out).unwrap();
        (hospital, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_admit_discharge_and_bill() {
        let dir = tempfile::tempdir().unwrap();
        let script = "1\nP001\nAsha\n40\nICU\n2\nP001\n6\n10\n8\nP001\n9\n";
        let (hospital, out) = session(dir.path(), script);
        assert!(out.contains("Patient Asha admitted successfully!"));
        assert!(out.contains("Patient Asha discharged successfully."));
        assert!(out.contains("Final Bill: 4500.00"));
        assert!(out.contains("Goodbye!"));
        assert_eq!(hospital.patients().len(), 1);
        assert!(Store::new(dir.path()).rates_path().exists());
    }

    #[test]
    fn test_errors_are_reported_and_loop_continues() {
        let dir = tempfile::tempdir().unwrap();
        let script = "1\nP001\nOld\n200\nICU\n2\nP999\nabc\n3\n";
        let (hospital, out) = session(dir.path(), script);
        assert!(out.contains("Field: Age"));
        assert!(out.contains("patient 'P999' does not exist"));
        assert!(out.contains("Invalid choice. Please try again."));
        assert!(out.contains("No patients in the system"));
        // End of input saves like an explicit exit.
        assert!(out.contains("Goodbye!"));
        assert!(hospital.patients().is_empty());
    }

    #[test]
    fn test_bill_for_admitted_patient_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let script = "1\nP001\nAsha\n40\nGeneral\n8\nP001\n5\n9\n";
        let (_, out) = session(dir.path(), script);
        assert!(out.contains("Patient P001 is still admitted. Cannot generate bill."));
        assert!(out.contains("  - Asha (ID: P001)"));
    }
}
