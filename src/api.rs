//! HTTP API for the Ward Engine.
//!
//! This module exposes the hospital over a small JSON API using the
//! [`axum`](https://crates.io/crates/axum) framework.  The whole
//! [`Hospital`] sits behind one `RwLock`: admissions, discharges and
//! discount changes take the write lock, so two concurrent admissions
//! can never both claim the last bed of a ward.

use crate::error::HospitalError;
use crate::hospital::Hospital;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::RwLock;
use tracing::info;

/// Application state shared across requests.
pub struct AppState {
    pub hospital: RwLock<Hospital>,
}

#[derive(Debug, Deserialize)]
pub struct AdmitRequest {
    pub id: String,
    pub name: String,
    pub age: i32,
    pub ward: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub percentage: f64,
}

/// Error body returned by every failing route.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<HospitalError> for ApiError {
    fn from(err: HospitalError) -> Self {
        let status = match err {
            HospitalError::PatientNotFound(_) => StatusCode::NOT_FOUND,
            HospitalError::NoBedsAvailable { .. } | HospitalError::AlreadyDischarged { .. } => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Build the API router around an opened hospital.  Returns the router
/// and a handle to the state.
pub fn build_router(hospital: Hospital) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        hospital: RwLock::new(hospital),
    });
    let router = Router::new()
        .route("/api/patients", get(list_patients).post(admit_patient))
        .route("/api/patients/:id/discharge", post(discharge_patient))
        .route("/api/wards/occupancy", get(ward_occupancy))
        .route("/api/wards/allocations", get(ward_allocations))
        .route("/api/billing/discount", put(apply_discount))
        .route("/api/billing/report", get(billing_report))
        .route("/api/billing/:id", get(patient_bill))
        .with_state(state.clone());
    (router, state)
}

async fn admit_patient(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut hospital = state.hospital.write().await;
    let record = hospital.admit(&req.id, &req.name, req.age, &req.ward)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn discharge_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut hospital = state.hospital.write().await;
    Ok(Json(hospital.discharge(&id)?))
}

async fn list_patients(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hospital.read().await.patients())
}

async fn ward_occupancy(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hospital.read().await.occupancy())
}

async fn ward_allocations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hospital.read().await.allocations())
}

async fn apply_discount(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DiscountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.hospital.write().await.apply_discount(req.percentage)?;
    Ok(Json(json!({ "discount_percentage": req.percentage })))
}

async fn billing_report(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hospital.read().await.billing_report())
}

async fn patient_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.hospital.read().await.bill_for(&id)? {
        Some(bill) => Ok(Json(bill)),
        None => Err(ApiError {
            status: StatusCode::CONFLICT,
            message: format!("patient '{id}' is still admitted, no bill yet"),
        }),
    }
}

/// Launch the API server on `addr`.  Runs until Ctrl+C, then saves the
/// hospital's data.
pub async fn serve(addr: &str, hospital: Hospital) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "server listening");
    serve_until(listener, hospital, shutdown_signal()).await
}

/// Serves on `listener` until `shutdown` resolves, lets in-flight
/// requests finish and writes patients and rates back to disk.
pub async fn serve_until<F>(listener: TcpListener, hospital: Hospital, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (router, state) = build_router(hospital);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server stopped, saving data");
    state.hospital.read().await.save()?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
}
