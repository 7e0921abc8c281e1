pub mod client;

pub use client::ApiClient;
pub use trajview_api;
