//! # evalflow
//!
//! Train/evaluate scheduling for online machine-learning evaluation.
//!
//! ```text
//! JSONL events → EventReader
//!     ↓
//! EvaluationObserver ──update──▶ TrainEvalTrigger (prequential, holdout, crossval)
//!     │  shall_predict → StreamModel::predict
//!     │  shall_buffer  → pending-fit buffer
//!     │  instances_to_fit / remaining_buffer
//!     ↓
//! StreamModel::partial_fit        ResultsSink::report (JSONL / SQLite)
//! ```
//!
//! ## Module Organization
//!
//! - `trigger` - the four protocol state machines and their shared interface
//! - `event` - event records and time extraction
//! - `event_reader` - JSONL event source
//! - `model` - model collaborator trait and baselines
//! - `report` - results sinks
//! - `observer` - the driving loop
//! - `config` - environment configuration

pub mod config;
pub mod event;
pub mod event_reader;
pub mod model;
pub mod observer;
pub mod report;
pub mod trigger;

pub use config::{BackendType, ConfigError, ReplayConfig};
pub use event::{field_time_extractor, Event, EventTimeFn, Features, Label};
pub use event_reader::{EventError, EventReader};
pub use model::{AlgorithmType, StreamModel};
pub use observer::{EvalError, EvaluationObserver, ObserverStats};
pub use report::{ResultsSink, SinkError};
pub use trigger::{BufferView, FitSet, Protocol, TrainEvalTrigger, TriggerConfig, TriggerError};
