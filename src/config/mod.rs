// src/config/mod.rs
pub mod engine;
pub mod translator;

pub use engine::EngineConfig;
pub use translator::TranslatorConfig;
