pub mod origin;
pub mod security_headers;
pub mod tracing;

pub use origin::same_origin_middleware;
pub use security_headers::security_headers_middleware;
pub use tracing::{request_id_middleware, request_id_of, RequestId, REQUEST_ID_HEADER};
