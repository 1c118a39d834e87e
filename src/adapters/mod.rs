// Adapters layer: concrete file sources and the HTTP client for the catalog backend.

pub mod http;
pub mod local;

pub use http::HttpImportGateway;
pub use local::LocalFileSource;
