//! `gtk-replay`: re-drive a recorded action list from a starting state and
//! print the resulting receipt chain, or the index of first divergence if
//! an expected trail was supplied for comparison.

use std::fs;
use std::process::ExitCode;

use gtk_kernel::{replay, verify_replay, ChainTip, GmiParams, GridAction, GridState, Q, RichReceipt};
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

fn parse_bool(args: &[String], name: &str) -> bool {
    let long = format!("--{name}");
    args.iter().any(|a| a == &long)
}

#[derive(Debug, Deserialize)]
struct ReplayInputFile {
    state0: GridStateFile,
    actions: Vec<ActionFile>,
    #[serde(default)]
    expected_receipts: Vec<RichReceipt>,
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

#[derive(Debug, Deserialize)]
struct ActionFile {
    drho: Vec<Vec<i64>>,
    dtheta: Vec<Vec<i64>>,
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let input_path = parse_flag(&args, "input").unwrap_or("replay_input.json");
    let check = parse_bool(&args, "check");

    tracing_subscriber::fmt::try_init().ok();

    let raw = fs::read_to_string(input_path)?;
    let parsed: ReplayInputFile = serde_json::from_str(&raw)?;
    let state0 = parsed.state0.into_state();
    let actions: Vec<GridAction> = parsed
        .actions
        .into_iter()
        .map(|a| GridAction { drho: a.drho, dtheta: a.dtheta, u_glyph: None })
        .collect();
    let params = GmiParams::default();

    if check && !parsed.expected_receipts.is_empty() {
        let divergence = verify_replay(state0, ChainTip::genesis(), &actions, &params, &parsed.expected_receipts)?;
        match divergence {
            None => {
                tracing::info!(count = parsed.expected_receipts.len(), "replay matches recorded trail");
                println!("{}", serde_json::json!({"divergence": serde_json::Value::Null}));
            }
            Some(d) => {
                tracing::warn!(index = d.index, reason = %d.reason, "replay diverged");
                println!("{}", serde_json::json!({"divergence": {"index": d.index, "reason": d.reason}}));
            }
        }
        return Ok(());
    }

    let report = replay(state0, ChainTip::genesis(), &actions, &params)?;
    tracing::info!(steps = report.receipts.len(), "replay complete");
    println!(
        "{}",
        serde_json::json!({
            "final_t": report.final_state.t,
            "final_chain": hex::encode(report.final_chain.chain_hash),
            "receipt_count": report.receipts.len(),
        })
    );
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gtk-replay: {err:#}");
            ExitCode::FAILURE
        }
    }
}
