//! basic — end-to-end walk through the schedule-resource workspace.
//!
//! Builds a tree, creates a heating setpoint schedule, fills one day of
//! quarter-hourly values, reads them back under different interpolation
//! modes, links an alias, and exports the result as CSV.
//!
//! ```text
//! cargo run -p basic                       # in-memory stores
//! cargo run -p basic -- tree.json          # TreeConfig from a JSON file
//! RUST_LOG=debug cargo run -p basic        # show every committed mutation
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use sr_core::{InterpolationMode, ResourcePath, Timestamp, Value};
use sr_schedule::ScheduleTree;
use sr_tree::{ChangeEvent, TreeConfig, TreeContextBuilder};

// ── Constants ─────────────────────────────────────────────────────────────────

const QUARTER_HOUR_MS: i64   = 15 * 60 * 1_000;
const STEPS_PER_DAY:   usize = 96;
const COMFORT_C:       f64   = 21.5;
const SETBACK_C:       f64   = 17.0;

fn load_config(path: Option<&Path>) -> Result<TreeConfig> {
    let Some(path) = path else {
        return Ok(TreeConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: TreeConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

/// Comfort temperature from 06:00 to 22:00, setback otherwise.
fn setpoint_profile() -> Vec<Value> {
    (0..STEPS_PER_DAY)
        .map(|step| {
            let hour = step / 4;
            let c = if (6..22).contains(&hour) { COMFORT_C } else { SETBACK_C };
            Value::Float(c)
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref().map(Path::new))?;
    let ctx = TreeContextBuilder::new().config(config).build()?;
    let tree = ScheduleTree::new(ctx)?;

    tree.context().notifications.subscribe(Arc::new(|e: &ChangeEvent| {
        tracing::info!(event = %e, "listener");
    }));

    // ── Build a day of setpoints ──────────────────────────────────────────
    let setpoint_path: ResourcePath = "house/heating/setpoint".parse()?;
    let setpoint = tree.create(setpoint_path.clone())?;
    let midnight = Timestamp(0);
    setpoint.replace_values_fixed_step(midnight, &setpoint_profile(), QUARTER_HOUR_MS, None)?;
    println!("{} samples in {}", setpoint.len()?, setpoint.path());

    // ── Read back under two interpolation modes ───────────────────────────
    let probe = midnight + (6 * 60 + 7) * 60 * 1_000; // 06:07
    println!("value at 06:07 with no interpolation: {:?}", setpoint.value_at(probe)?.map(|s| s.value));
    setpoint.set_interpolation_mode(InterpolationMode::Steps)?;
    println!("value at 06:07 with step interpolation: {:?}", setpoint.value_at(probe)?.map(|s| s.value));

    // ── Alias another room at the same schedule ───────────────────────────
    let bedroom = tree.create_reference("house/bedroom/setpoint".parse()?, &setpoint_path)?;
    bedroom.add_value(midnight + 23 * 3_600_000, 16.0)?;
    println!(
        "bedroom aliases {}; owner now has {} samples",
        bedroom.location()?,
        setpoint.len()?
    );
    bedroom.delete()?;
    println!("after deleting the alias the owner still has {} samples", setpoint.len()?);

    // ── Export ────────────────────────────────────────────────────────────
    let out = std::env::temp_dir().join("setpoint.csv");
    let rows = setpoint.export_csv(&out)?;
    println!("wrote {rows} rows to {}", out.display());
    Ok(())
}
