//! Configuration module for lecnav.
//!
//! Handles loading and saving application settings.

mod settings;

pub use settings::{
    EmbeddingSettings, GeneralSettings, RetrievalSettings, SegmentationSettings, ServerSettings,
    Settings, VectorStoreSettings, WindowSettings,
};
