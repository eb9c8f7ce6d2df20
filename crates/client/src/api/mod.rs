//! Per-area ADT endpoints.

pub mod activation;
pub mod checks;
pub mod data_preview;
pub mod objects;
pub mod transports;

pub use activation::ActivationApi;
pub use checks::ChecksApi;
pub use data_preview::DataPreviewApi;
pub use objects::ObjectsApi;
pub use transports::TransportsApi;
