//! # dealflow
//!
//! Runs chained AI analysis agents over a business-acquisition deal. A
//! workflow is an ordered list of agent steps; each step may be gated on an
//! earlier step's output and either skip itself or stop the run when the gate
//! is not met.
//!
//! ## Usage
//!
//! ```bash
//! dealflow run full_initial_analysis --deal deal.json
//! ```
//!
//! ## Modules
//!
//! - `abstractions` - Agent invocation seam and the Gemini HTTP implementation
//! - `catalog` - Built-in agent and workflow catalogs
//! - `cli` - Command-line argument model and subcommand handlers
//! - `config` - Layered configuration (defaults, TOML file, environment)
//! - `deal` - Opaque deal context passed to every agent
//! - `display` - Status projection, live progress and run reports
//! - `registry` - Agent lookup by id
//! - `workflow` - Definitions, condition evaluation and the sequential executor
//! - `testing` - Mock invoker and fixtures for tests
pub mod abstractions;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod deal;
pub mod display;
pub mod error;
pub mod registry;
pub mod workflow;

pub mod testing;
