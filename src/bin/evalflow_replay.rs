//! Evalflow Replay - run an evaluation protocol over a recorded event stream
//!
//! Reads a JSONL file of events, drives a baseline model through the
//! configured train/evaluate trigger, and reports scored predictions.
//!
//! Usage:
//!   cargo run --release --bin evalflow_replay -- [--backend jsonl|sqlite]
//!
//! Environment variables (see `evalflow::config` for the full list):
//!   EVALFLOW_INPUT_PATH - JSONL event stream (required)
//!   EVALFLOW_OUTPUT_PATH - report file or database
//!   EVALFLOW_PROTOCOL - prequential, time_holdout, quantity_holdout, time_crossval
//!   EVALFLOW_TIME_FIELD - event field holding the timestamp (time-based protocols)
//!   RUST_LOG - Logging level (optional, default: info)

use dotenv::dotenv;
use evalflow::config::{BackendType, ReplayConfig};
use evalflow::event::field_time_extractor;
use evalflow::event_reader::EventReader;
use evalflow::model::baseline_for;
use evalflow::observer::EvaluationObserver;
use evalflow::report::open_sink;
use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let backend = BackendType::parse_from_args();
    let config = ReplayConfig::from_env(backend)?;

    info!("🚀 Starting evalflow replay");
    info!("   ├─ Input: {}", config.input_path.display());
    info!("   ├─ Protocol: {}", config.trigger.protocol.as_str());
    info!("   ├─ Algorithm: {}", config.algorithm.as_str());
    info!("   └─ Output ({:?}): {}", config.backend, config.output_path.display());

    let time_fn = config
        .trigger
        .protocol
        .is_time_based()
        .then(|| field_time_extractor(config.time_field.clone()));
    let trigger = config.trigger.build(time_fn)?;

    let sink = open_sink(config.backend, &config.output_path)?;
    let model = baseline_for(config.algorithm);
    let mut observer = EvaluationObserver::new(model, trigger, sink, config.classes.clone());

    let events = EventReader::open(&config.input_path)?;
    let stats = observer.replay(events)?;

    info!(
        "✅ Replayed {} events: {} scored, {} fits, {} reports",
        stats.events, stats.predictions, stats.fits, stats.reports
    );
    Ok(())
}
