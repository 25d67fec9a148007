#[cfg(feature = "native")]
pub mod app;
pub mod assets;
pub mod config;
pub mod graphics;
pub mod input;
pub mod math;
pub mod renderer;
pub mod scenario;
pub mod simulation;

#[cfg(feature = "native")]
pub use app::OrreryApp;
pub use config::OrreryConfig;
pub use simulation::SolarSystem;

#[derive(thiserror::Error, Debug)]
pub enum OrreryError {
    #[error("Invalid sphere resolution {0}: at least 4 samples are required")]
    InvalidResolution(u32),
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
    #[error("Rotation axis has zero length")]
    DegenerateAxis,
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),
    #[error("No body with id {0}")]
    UnknownBody(usize),
    #[error("Graphics error: {0}")]
    Graphics(String),
    #[error("Asset loading error: {0}")]
    AssetLoading(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Configuration parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type OrreryResult<T> = Result<T, OrreryError>;
