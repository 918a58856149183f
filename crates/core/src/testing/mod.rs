//! Testing utilities for end-to-end transcode tests.
//!
//! Provides synthetic FLAC files with controllable stream info and tags, and
//! stand-in `flac`, `sox` and `lame` executables, so full transcodes can run
//! without real audio or installed encoders.
//!
//! # Example
//!
//! ```rust,ignore
//! use better_core::testing::{write_flac_fixture, FakeTools, FlacFixture};
//!
//! let fixture = FlacFixture::new(24, 96000, 2).with_tag("TITLE", "Intro");
//! write_flac_fixture(&source.join("01.flac"), &fixture)?;
//!
//! let tools = FakeTools::new().install(&bin_dir)?;
//! ```

mod fake_tools;
mod fixtures;

pub use fake_tools::FakeTools;
pub use fixtures::{write_flac_fixture, FlacFixture};
