use crate::config::EdgeConfig;
use crate::proxy::Proxy;
use crate::resolver::SessionResolver;

/// Shared state for the edge process: the session resolver, the upstream
/// proxy and the completed configuration.
pub struct EdgeContext {
    pub resolver: Box<dyn SessionResolver>,
    pub proxy: Proxy,
    pub cfg: EdgeConfig,
}

impl EdgeContext {
    #[cfg(test)]
    pub fn new_test(resolver: Box<dyn SessionResolver>, cfg: EdgeConfig) -> Self {
        Self {
            proxy: Proxy::new(&cfg.site_url),
            resolver,
            cfg,
        }
    }
}
