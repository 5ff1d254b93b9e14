use std::sync::Arc;

use linkhop_service::LinkResolver;

#[derive(Clone)]
pub struct AppState {
    resolver: Arc<dyn LinkResolver>,
    base_url: String,
    trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(resolver: Arc<dyn LinkResolver>, public_base_url: impl Into<String>) -> Self {
        Self {
            resolver,
            base_url: public_base_url.into(),
            trust_forwarded_for: false,
        }
    }

    /// Take the client identity from `X-Forwarded-For` when present.
    ///
    /// Only enable this behind a proxy that overwrites the header.
    pub fn with_trusted_proxy(mut self, trust_forwarded_for: bool) -> Self {
        self.trust_forwarded_for = trust_forwarded_for;
        self
    }

    pub fn resolver(&self) -> &dyn LinkResolver {
        self.resolver.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn trust_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }
}
