pub mod context;
pub mod cors;
mod guards;
pub mod handler;
pub mod http_result;
pub mod server;
pub mod snippet;
pub mod synthetic_response;

pub use context::{AppState, Route, Routes};
pub use handler::handle_request;
pub use http_result::HttpError;
pub use server::{run, serve};
pub use snippet::{log_snippet, script_snippet};
