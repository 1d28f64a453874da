mod request;
mod tracking;

pub use request::handle_request;
