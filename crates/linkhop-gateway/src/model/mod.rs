mod health;
mod link;

pub use health::{DeepHealthResponse, HealthResponse, ServiceHealth};
pub use link::{CreateLinkRequest, LinkDetailResponse, LinkResponse, UpdateLinkRequest};
