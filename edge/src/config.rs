use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::warn;
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslMethod};
use serde::{Deserialize, Serialize};
use url::Url;

use admingate_misc::config::{expandenv, CommonConfig, PathSet};
use admingate_misc::logs::LogsConfig;

use crate::context::EdgeContext;
use crate::proxy::Proxy;
use crate::resolver::RestfulResolver;
use crate::server::EdgeServer;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EdgeConfig {
    #[serde(default = "EdgeConfig::default_bind")]
    pub bind: String,

    #[serde(default)]
    pub ssl: bool,

    /// The global enforcement flag. When off, every request passes the
    /// gate untouched; meant for environments where the gate cannot be
    /// trusted (local development) to avoid locking everyone out.
    #[serde(default = "EdgeConfig::default_enforce")]
    pub enforce: bool,

    /// Origin of the storefront API the session resolver calls. When
    /// empty, or on a different origin than the request, cookie
    /// forwarding cannot be trusted and the gate steps aside.
    #[serde(default)]
    pub api_url: String,

    /// Origin of the storefront itself; pass-through requests are
    /// proxied here.
    #[serde(default = "EdgeConfig::default_site_url")]
    pub site_url: String,

    pub keep_alive_secs: Option<u64>,

    pub workers: Option<u64>,

    pub payload_limit_mib: Option<u64>,

    #[serde(default = "LogsConfig::default")]
    pub logs: LogsConfig,

    #[serde(skip)]
    pki_dir: PathBuf,
}

impl CommonConfig for EdgeConfig {
    fn default() -> Self {
        EdgeConfig {
            bind: Self::default_bind(),
            ssl: false,
            enforce: Self::default_enforce(),
            api_url: String::new(),
            site_url: Self::default_site_url(),
            keep_alive_secs: None,
            workers: None,
            payload_limit_mib: None,
            logs: LogsConfig::default(),
            pki_dir: PathBuf::new(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.bind.is_empty() {
            bail!("bind is required");
        }

        self.site_url = expandenv("site_url", &self.site_url)?;
        if self.site_url.is_empty() {
            bail!("site_url is required");
        }
        validate_origin("site_url", &self.site_url)?;

        self.api_url = expandenv("api_url", &self.api_url)?;
        if self.api_url.is_empty() {
            warn!("api_url is not configured, edge enforcement will be bypassed");
        } else {
            validate_origin("api_url", &self.api_url)?;
        }

        if let Some(keep_alive_secs) = self.keep_alive_secs {
            if keep_alive_secs == 0 {
                bail!("keep_alive_secs must be greater than 0");
            }
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                bail!("workers must be greater than 0");
            }
        }

        if let Some(payload_limit_mib) = self.payload_limit_mib {
            if payload_limit_mib == 0 {
                bail!("payload_limit_mib must be greater than 0");
            }
        }

        self.logs.complete(ps).context("logs")?;

        self.pki_dir = ps.pki_path.clone();

        Ok(())
    }
}

impl EdgeConfig {
    pub fn build_ctx(&self) -> Result<Arc<EdgeContext>> {
        let ctx = EdgeContext {
            resolver: Box::new(RestfulResolver::new(&self.api_url)),
            proxy: Proxy::new(&self.site_url),
            cfg: self.clone(),
        };
        Ok(Arc::new(ctx))
    }

    pub fn build_server(&self, ctx: Arc<EdgeContext>) -> Result<EdgeServer> {
        let mut srv = EdgeServer::new(self.bind.clone(), ctx);
        if self.ssl {
            let ssl = self.build_ssl()?;
            srv.set_ssl(ssl);
        }

        if let Some(keep_alive_secs) = self.keep_alive_secs {
            srv.set_keep_alive_secs(keep_alive_secs);
        }

        if let Some(workers) = self.workers {
            srv.set_workers(workers);
        }

        if let Some(payload_limit_mib) = self.payload_limit_mib {
            srv.set_payload_limit_mib(payload_limit_mib);
        }

        Ok(srv)
    }

    fn build_ssl(&self) -> Result<SslAcceptorBuilder> {
        let key_path = self.pki_dir.join("key.pem");
        if !key_path.exists() {
            bail!("ssl key file not exists: {:?}", key_path);
        }

        let cert_path = self.pki_dir.join("cert.pem");
        if !cert_path.exists() {
            bail!("ssl cert file not exists: {:?}", cert_path);
        }

        let mut builder =
            SslAcceptor::mozilla_intermediate(SslMethod::tls()).context("init ssl acceptor")?;

        builder
            .set_private_key_file(&key_path, openssl::ssl::SslFiletype::PEM)
            .context("load ssl key file")?;
        builder
            .set_certificate_chain_file(&cert_path)
            .context("load ssl cert file")?;

        Ok(builder)
    }

    fn default_bind() -> String {
        String::from("127.0.0.1:13688")
    }

    fn default_enforce() -> bool {
        true
    }

    fn default_site_url() -> String {
        String::from("http://127.0.0.1:3000")
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        <Self as CommonConfig>::default()
    }
}

fn validate_origin(name: &str, value: &str) -> Result<()> {
    let parsed = match Url::parse(value) {
        Ok(url) => url,
        Err(_) => bail!("invalid {name} '{value}'"),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        _ => bail!(
            "invalid {name} scheme, expect 'http' or 'https', not '{}'",
            parsed.scheme()
        ),
    }

    if parsed.path() != "/" {
        bail!("invalid {name}, path should be '/', not '{}'", parsed.path());
    }

    Ok(())
}
