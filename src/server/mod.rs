//! Request and response types, the application handler and the pieces of
//! response production it drives: OPTIONS synthesis and suspended responses.

mod async_response;
mod handler;
mod options;
mod request;
mod response;


pub use async_response::AsyncResponse;
pub use handler::ApplicationHandler;
pub use options::options_response;
pub use request::Request;
pub use response::{status_reason, HeaderVec, Response, MAX_INLINE_HEADERS};
