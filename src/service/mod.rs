pub mod image_request;
pub mod session;
pub mod stream_merge;
