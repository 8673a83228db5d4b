//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes envelopes as pretty-printed JSON dumps
//!
//! # Output Files
//!
//! ```text
//! /data/
//! ├── dump_headlines.json   # HeadlinesEnvelope
//! └── dump_categories.json  # KeywordsEnvelope
//! ```

pub mod json;
