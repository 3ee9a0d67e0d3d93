//! `gtk-api`: an optional HTTP surface over the kernel's pure functions,
//! gated behind the `api` feature. Thin JSON wrappers around
//! [`gtk_kernel::step`], [`gtk_kernel::verify_grid_step`], and
//! [`gtk_kernel::replay`] — the HTTP layer holds no kernel state of its own
//! beyond what each request supplies.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State as AxumState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use gtk_kernel::{replay, step, verify_grid_step, ChainTip, GmiParams, GridAction, GridState, Q, RichReceipt, VerifierState};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

struct ApiState {
    params: GmiParams,
}

#[derive(Debug, Deserialize)]
struct StepRequest {
    state: GridStateWire,
    action: ActionWire,
}

#[derive(Debug, Serialize)]
struct StepResponse {
    accepted: bool,
    reject_code: Option<&'static str>,
    receipt: RichReceipt,
    next_t: u64,
}

#[derive(Debug, Deserialize)]
struct GridStateWire {
    rho: Vec<Vec<u64>>,
    theta: Vec<Vec<i64>>,
    curvature: Vec<Vec<u64>>,
    budget_value: u128,
    t: u64,
}

impl GridStateWire {
    fn into_state(self) -> GridState {
        GridState {
            rho: self.rho,
            theta: self.theta,
            curvature: self.curvature,
            budget: Q::from_raw(self.budget_value, gtk_kernel::GMI_SCALE),
            t: self.t,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionWire {
    drho: Vec<Vec<i64>>,
    dtheta: Vec<Vec<i64>>,
}

async fn handle_step(AxumState(state): AxumState<Arc<ApiState>>, Json(req): Json<StepRequest>) -> impl IntoResponse {
    let grid_state = req.state.into_state();
    let action = GridAction { drho: req.action.drho, dtheta: req.action.dtheta, u_glyph: None };

    match step(&grid_state, &action, &state.params, &ChainTip::genesis()) {
        Ok((next, receipt)) => {
            let response = StepResponse {
                accepted: receipt.is_accepted(),
                reject_code: receipt.reject_code.map(|c| c.as_str()),
                next_t: next.t,
                receipt,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({"error": err.to_string()}))).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    before: GridStateWire,
    after: GridStateWire,
    receipt: RichReceipt,
}

async fn handle_verify(AxumState(state): AxumState<Arc<ApiState>>, Json(req): Json<VerifyRequest>) -> impl IntoResponse {
    let before = req.before.into_state();
    let after = req.after.into_state();
    let mut vstate = VerifierState::new();
    let outcome = verify_grid_step(&before, &after, &req.receipt, &before.budget, &Q::zero(gtk_kernel::GMI_SCALE), &mut vstate, &state.params);
    (StatusCode::OK, Json(serde_json::json!({"outcome": format!("{outcome:?}")}))).into_response()
}

#[derive(Debug, Deserialize)]
struct ReplayRequest {
    state0: GridStateWire,
    actions: Vec<ActionWire>,
}

async fn handle_replay(AxumState(state): AxumState<Arc<ApiState>>, Json(req): Json<ReplayRequest>) -> impl IntoResponse {
    let state0 = req.state0.into_state();
    let actions: Vec<GridAction> = req.actions.into_iter().map(|a| GridAction { drho: a.drho, dtheta: a.dtheta, u_glyph: None }).collect();

    match replay(state0, ChainTip::genesis(), &actions, &state.params) {
        Ok(report) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "final_t": report.final_state.t,
                "final_chain": hex::encode(report.final_chain.chain_hash),
                "receipt_count": report.receipts.len(),
            })),
        )
            .into_response(),
        Err(err) => (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({"error": err.to_string()}))).into_response(),
    }
}

fn build_router(params: GmiParams) -> Router {
    let shared = Arc::new(ApiState { params });
    Router::new()
        .route("/v1/step", post(handle_step))
        .route("/v1/verify", post(handle_verify))
        .route("/v1/replay", post(handle_replay))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();

    let addr: SocketAddr = std::env::var("GTK_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()).parse()?;
    let router = build_router(GmiParams::default());

    tracing::info!(%addr, "gtk-api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
