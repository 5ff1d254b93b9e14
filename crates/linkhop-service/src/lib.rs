//! Link resolution and registration.
//!
//! [`ResolutionService`] wires the cache hierarchy, the rate limiter and the
//! code generator around a durable store. HTTP layers depend on the
//! object-safe [`LinkResolver`] trait rather than on the concrete service.

pub mod click;
pub mod config;
pub mod error;
pub mod resolver;
pub mod service;

pub use click::{drain_clicks, ChannelClickSink, ClickEvent, ClickSink, NoopClickSink};
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use resolver::{ClientContext, CreateLink, Created, LinkResolver, Resolution};
pub use service::ResolutionService;
