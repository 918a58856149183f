//! Chained external-process pipelines.
//!
//! A [`PipelineSpec`] describes the processes that turn one source track into
//! one output file. The [`PipelineBuilder`] creates specs, a [`ProcessChain`]
//! runs one spec with every stage's stdout wired straight into the next
//! stage's stdin, and the [`PipelineExecutor`] runs many chains at once under
//! a worker bound, tearing everything down on the first failure.
//!
//! # Example
//!
//! ```ignore
//! use better_core::pipeline::{PipelineBuilder, PipelineExecutor};
//!
//! let builder = PipelineBuilder::new(config.tools.clone());
//! let spec = builder.build(0, &track, destination, TargetFormat::Mp3V0, plan);
//! spec.prepare().await?;
//!
//! let report = PipelineExecutor::new(4).execute(vec![spec]).await?;
//! println!("{} pipelines in {} ms", report.pipelines, report.duration_ms);
//! ```

mod builder;
mod chain;
mod error;
mod executor;
mod types;

pub use builder::PipelineBuilder;
pub use chain::ProcessChain;
pub use error::PipelineError;
pub use executor::PipelineExecutor;
pub use types::{ExecutionReport, PipelineEvent, PipelineSpec, StageCommand};
