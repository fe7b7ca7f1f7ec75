//! Flat-file persistence.
//!
//! Patients live in `patients.csv`, ward rates in `rates.cfg` and the
//! last billing report in `billing_report.txt`, all inside one data
//! directory.  Loading is forgiving: a missing file means there is
//! nothing to load, and a malformed line is logged and skipped so one
//! bad record never sinks the rest.

use crate::billing::BillingService;
use crate::models::{Patient, PatientRecord, PatientStatus};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::str::Utf8Error;
use tracing::{info, warn};

pub const PATIENTS_FILE: &str = "patients.csv";
pub const RATES_FILE: &str = "rates.cfg";
pub const REPORT_FILE: &str = "billing_report.txt";

const PATIENTS_HEADER: &str = "PatientID,Name,Age,Ward,AdmitDate,Status,DischargeDate";

/// File system failures.  These are kept apart from
/// [`crate::error::HospitalError`]; a broken disk is not a domain rule.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a single line could not be turned into a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("expected at least {expected} fields, found {found}")]
    MissingFields { expected: usize, found: usize },
    #[error("invalid age '{0}'")]
    Age(String),
    #[error("invalid date '{0}'")]
    Date(String),
    #[error("invalid status '{0}'")]
    Status(String),
    #[error("expected 'Ward=rate'")]
    RateFormat,
    #[error("invalid rate '{0}'")]
    Rate(String),
}

/// Parses one data line of `patients.csv`.  The discharge date column
/// is optional.
pub fn parse_patient_line(line: &str) -> Result<PatientRecord, RecordError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 6 {
        return Err(RecordError::MissingFields {
            expected: 6,
            found: parts.len(),
        });
    }
    let age = parts[2]
        .parse::<u8>()
        .map_err(|_| RecordError::Age(parts[2].to_string()))?;
    let admit_date = parse_date(parts[4])?;
    let status = parts[5]
        .parse::<PatientStatus>()
        .map_err(|_| RecordError::Status(parts[5].to_string()))?;
    let discharge_date = match parts.get(6) {
        Some(value) if !value.is_empty() => Some(parse_date(value)?),
        _ => None,
    };
    Ok(PatientRecord {
        id: parts[0].to_string(),
        name: parts[1].to_string(),
        age,
        ward: parts[3].to_string(),
        admit_date,
        status,
        discharge_date,
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, RecordError> {
    value
        .parse::<NaiveDate>()
        .map_err(|_| RecordError::Date(value.to_string()))
}

/// Formats a record as one line of `patients.csv`, without newline.
pub fn format_patient_line(record: &PatientRecord) -> String {
    format!(
        "{},{},{},{},{},{},{}",
        record.id,
        record.name,
        record.age,
        record.ward,
        record.admit_date,
        record.status,
        record
            .discharge_date
            .map(|d| d.to_string())
            .unwrap_or_default()
    )
}

/// Parses one `Ward=rate` line of `rates.cfg`.
pub fn parse_rate_line(line: &str) -> Result<(String, f64), RecordError> {
    let (ward, rate) = line.split_once('=').ok_or(RecordError::RateFormat)?;
    let (ward, rate) = (ward.trim(), rate.trim());
    if ward.is_empty() || rate.contains('=') {
        return Err(RecordError::RateFormat);
    }
    let rate = rate
        .parse::<f64>()
        .map_err(|_| RecordError::Rate(rate.to_string()))?;
    Ok((ward.to_string(), rate))
}

/// Data directory holding the hospital's files.
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn patients_path(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_FILE)
    }

    pub fn rates_path(&self) -> PathBuf {
        self.data_dir.join(RATES_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join(REPORT_FILE)
    }

    /// Reads every well-formed patient record.  The first line is a
    /// header.
    pub fn load_patients(&self) -> Result<Vec<PatientRecord>, StoreError> {
        let path = self.patients_path();
        let Some(contents) = read_optional(&path)? else {
            info!(path = %path.display(), "no patient file, starting empty");
            return Ok(Vec::new());
        };
        let mut records = Vec::new();
        for (number, line) in decoded_lines(&contents).skip(1) {
            let line = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => line,
                Err(err) => {
                    warn!(line = number, %err, "skipping undecodable patient record");
                    continue;
                }
            };
            match parse_patient_line(line) {
                Ok(record) => records.push(record),
                Err(err) => warn!(line = number, %err, "skipping patient record"),
            }
        }
        info!(count = records.len(), "patient records loaded");
        Ok(records)
    }

    /// Reads every well-formed rate.  Blank lines and `#` comments are
    /// ignored.
    pub fn load_rates(&self) -> Result<Vec<(String, f64)>, StoreError> {
        let path = self.rates_path();
        let Some(contents) = read_optional(&path)? else {
            info!(path = %path.display(), "no rate file, using default rates");
            return Ok(Vec::new());
        };
        let mut rates = Vec::new();
        for (number, line) in decoded_lines(&contents) {
            let line = match line {
                Ok(line) => line.trim(),
                Err(err) => {
                    warn!(line = number, %err, "skipping undecodable rate");
                    continue;
                }
            };
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_rate_line(line) {
                Ok(rate) => rates.push(rate),
                Err(err) => warn!(line = number, %err, "skipping rate"),
            }
        }
        Ok(rates)
    }

    pub fn save_patients(&self, records: &[PatientRecord]) -> Result<(), StoreError> {
        let mut contents = String::from(PATIENTS_HEADER);
        contents.push('\n');
        for record in records {
            contents.push_str(&format_patient_line(record));
            contents.push('\n');
        }
        self.write(&self.patients_path(), &contents)?;
        info!(count = records.len(), "patients saved");
        Ok(())
    }

    pub fn save_rates(&self, rates: &BTreeMap<String, f64>) -> Result<(), StoreError> {
        let mut contents = String::from("# Hospital Ward Rates Configuration\n");
        for (ward, rate) in rates {
            let _ = writeln!(contents, "{ward}={rate}");
        }
        self.write(&self.rates_path(), &contents)
    }

    /// Writes a plain-text report of every patient, with the bill for
    /// those already discharged.
    pub fn save_billing_report(
        &self,
        patients: &[Patient],
        billing: &BillingService,
    ) -> Result<(), StoreError> {
        let mut contents = String::from("HOSPITAL BILLING REPORT\n");
        contents.push_str(&"=".repeat(50));
        contents.push_str("\n\n");
        for patient in patients {
            let _ = writeln!(contents, "Patient: {} (ID: {})", patient.name(), patient.id());
            let _ = writeln!(
                contents,
                "Ward: {} | Days: {}",
                patient.ward(),
                patient.days_admitted()
            );
            let _ = writeln!(contents, "Status: {}", patient.status());
            if patient.is_discharged() {
                if let Some(bill) = billing.calculate_bill(patient) {
                    let _ = writeln!(contents, "Final Bill: {:.2}", bill.final_amount);
                }
            }
            contents.push('\n');
        }
        self.write(&self.report_path(), &contents)?;
        info!(path = %self.report_path().display(), "billing report saved");
        Ok(())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(&self.data_dir).map_err(write_err)?;
        std::fs::write(path, contents).map_err(write_err)
    }
}

/// Numbered lines of raw file contents.  Each line is decoded on its
/// own, so a stray non-UTF-8 byte only costs the line it sits on.
fn decoded_lines(bytes: &[u8]) -> impl Iterator<Item = (usize, Result<&str, Utf8Error>)> {
    bytes.split(|b| *b == b'\n').enumerate().map(|(index, raw)| {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        (index + 1, std::str::from_utf8(raw))
    })
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match std::fs::read(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
