//! Ward Engine library crate.
//!
//! This crate exposes hospital ward bed allocation, the patient
//! admission/discharge lifecycle and billing as reusable modules.
//! Applications drive a [`hospital::Hospital`] directly, through the
//! interactive [`menu`], or over HTTP via [`api::build_router`].

pub mod api;
pub mod billing;
pub mod config;
pub mod error;
pub mod hospital;
pub mod menu;
pub mod models;
pub mod registry;
pub mod store;
pub mod ward;

pub use error::{HospitalError, HospitalResult};
