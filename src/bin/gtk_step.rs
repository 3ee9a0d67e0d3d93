//! `gtk-step`: drive one GMI step from a JSON state/action file and print the
//! resulting state and receipt.
//!
//! Flags follow the same manual parsing style as the rest of this family of
//! binaries: `--flag value` or `--flag=value`, no external argv crate.

use std::fs;
use std::process::ExitCode;

use gtk_kernel::{step, ChainTip, GmiParams, GridAction, GridState};
use serde::{Deserialize, Serialize};

const FILE_MAGIC: &str = "GTKv1";

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

#[derive(Debug, Serialize, Deserialize)]
struct StepInputFile {
    magic: String,
    rho: Vec<Vec<u64>>,
    theta: Vec<Vec<i64>>,
    curvature: Vec<Vec<u64>>,
    budget_value: u128,
    t: u64,
    drho: Vec<Vec<i64>>,
    dtheta: Vec<Vec<i64>>,
}

fn load_input(path: &str) -> anyhow::Result<(GridState, GridAction)> {
    let raw = fs::read_to_string(path)?;
    let parsed: StepInputFile = serde_json::from_str(&raw)?;
    if parsed.magic != FILE_MAGIC {
        anyhow::bail!("unrecognized file magic: {}", parsed.magic);
    }
    let state = GridState {
        rho: parsed.rho,
        theta: parsed.theta,
        curvature: parsed.curvature,
        budget: gtk_kernel::numeric::Q::from_raw(parsed.budget_value, gtk_kernel::numeric::GMI_SCALE),
        t: parsed.t,
    };
    let action = GridAction { drho: parsed.drho, dtheta: parsed.dtheta, u_glyph: None };
    Ok((state, action))
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let input_path = parse_flag(&args, "input").unwrap_or("step_input.json");

    tracing_subscriber::fmt::try_init().ok();

    let (state, action) = load_input(input_path)?;
    let params = GmiParams::default();
    let (next_state, receipt) = step(&state, &action, &params, &ChainTip::genesis())?;

    tracing::info!(accepted = receipt.is_accepted(), receipt_id = %receipt.receipt_id, "step complete");
    println!(
        "{}",
        serde_json::json!({
            "accepted": receipt.is_accepted(),
            "reject_code": receipt.reject_code.map(|c| c.as_str()),
            "receipt_id": receipt.receipt_id,
            "chain_next": hex::encode(receipt.chain_next),
            "next_t": next_state.t,
        })
    );
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gtk-step: {err:#}");
            ExitCode::FAILURE
        }
    }
}
