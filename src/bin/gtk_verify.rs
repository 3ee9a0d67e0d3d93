//! `gtk-verify`: verify a single recorded receipt against its bracketing
//! states. The receipt's own fields are authoritative for dispatch; CLI
//! flags only point at input files.

use std::fs;
use std::process::ExitCode;

use gtk_kernel::{verify_grid_step, GmiParams, GridState, Q, RichReceipt, VerifierState, VerifyOutcome};
use serde::Deserialize;

fn parse_flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let long = format!("--{name}");
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix(&format!("{long}=")) {
            return Some(value);
        }
        if arg == &long {
            return iter.next().map(String::as_str);
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct VerifyInputFile {
    before: GridStateFile,
    after: GridStateFile,
    receipt: RichReceipt,
}

#[derive(Debug, Deserialize)]
struct GridStateFile {
    rho: Vec<Vec<u64>>,
    theta: Vec<Vec<i64>>,
    curvature: Vec<Vec<u64>>,
    budget_value: u128,
    t: u64,
}

impl GridStateFile {
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

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let input_path = parse_flag(&args, "input").unwrap_or("verify_input.json");

    tracing_subscriber::fmt::try_init().ok();

    let raw = fs::read_to_string(input_path)?;
    let parsed: VerifyInputFile = serde_json::from_str(&raw)?;
    let before = parsed.before.into_state();
    let after = parsed.after.into_state();
    let receipt = parsed.receipt;

    let params = GmiParams::default();
    let mut vstate = VerifierState::new();
    let outcome = verify_grid_step(&before, &after, &receipt, &before.budget, &Q::zero(gtk_kernel::GMI_SCALE), &mut vstate, &params);

    match &outcome {
        VerifyOutcome::Accept => {
            tracing::info!("receipt accepted");
            println!("{}", serde_json::json!({"outcome": "accept"}));
        }
        VerifyOutcome::Reject { code, detail } => {
            tracing::warn!(code = code.as_str(), %detail, "receipt rejected");
            println!("{}", serde_json::json!({"outcome": "reject", "code": code.as_str(), "detail": detail}));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gtk-verify: {err:#}");
            ExitCode::FAILURE
        }
    }
}
