pub mod engine;
pub mod handlers;
pub mod limits;
pub mod messages;
pub mod models;
pub mod report;
pub mod sentiment;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
pub mod test_support;

pub use engine::DialogueEngine;
pub use service::ScreeningService;
pub use store::JsonlStore;
