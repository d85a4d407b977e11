pub mod bundle;
pub mod download;
pub mod http;

pub use bundle::BundleDocumentSource;
pub use download::DownloadRetriever;
pub use http::HttpDocumentSource;
