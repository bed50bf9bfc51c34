pub mod admission_request;
pub mod admission_response;
pub mod admission_review;
mod api;
pub mod cli;
pub mod config;
mod server;
pub mod tracing;
pub mod webhook;

pub use api::AdapterError;
pub use server::AdmissionServer;
