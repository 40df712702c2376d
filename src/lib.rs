//! lecnav - Lecture transcript navigation
//!
//! Finds the time-stamped passages of a long transcript that best answer a
//! free-text query, and returns them as ranked, citable snippets.
//!
//! # Overview
//!
//! lecnav allows you to:
//! - Load SRT, WebVTT or JSON captions for a lecture or video
//! - Split them into overlapping fixed-duration windows
//! - Embed and index those windows per source
//! - Search them with vector similarity backed by a lexical fallback
//!
//! # Architecture
//!
//! - `segment` - Windowed transcript segmentation
//! - `retrieval` - Hybrid vector/lexical ranking
//! - `captions` - Caption file parsing
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `ingest` - Pipeline coordination
//! - `metrics` - Request counters and latency summaries
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust
//! use lecnav::segment::{segment, SegmentConfig, TimedUnit};
//!
//! let units = vec![
//!     TimedUnit::new(0.0, 20.0, "a"),
//!     TimedUnit::new(15.0, 40.0, "b"),
//!     TimedUnit::new(40.0, 60.0, "c"),
//! ];
//! let config = SegmentConfig::new(30.0, 15.0).unwrap();
//! let chunks = segment(&units, &config);
//!
//! assert_eq!(chunks[0].text, "a");
//! assert_eq!((chunks[0].start, chunks[0].end), (0.0, 20.0));
//! ```

pub mod captions;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod openai;
pub mod retrieval;
pub mod segment;
pub mod vector_store;

pub use error::{LecnavError, Result};
