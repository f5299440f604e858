pub mod panic;
pub mod tracing;

pub use self::panic::catch_panic_layer;
pub use self::tracing::{http_trace_layer, request_id_middleware, REQUEST_ID_HEADER};
