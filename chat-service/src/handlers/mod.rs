pub mod chat;
pub mod documents;
pub mod health;
pub mod metrics;

pub use chat::chat;
pub use documents::list_documents;
pub use health::health_check;
pub use metrics::metrics;
