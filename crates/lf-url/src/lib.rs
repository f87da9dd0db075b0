//! Short-form to canonical watch URL normalization.

pub mod canonical;
pub mod config;
pub mod normalizer;
pub mod params;

pub use canonical::CanonicalUrl;
pub use canonical::UrlForm;
pub use config::NormalizerConfig;
pub use normalizer::Normalizer;
pub use params::ParameterSet;
