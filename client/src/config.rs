use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use admingate_misc::config::{expandenv, CommonConfig, PathSet};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    /// Origin of the storefront API the identity refresh calls.
    #[serde(default = "ClientConfig::default_api_url")]
    pub api_url: String,

    /// The session cookie forwarded on refresh calls. May be empty, in
    /// which case every refresh resolves to "no identity".
    #[serde(default)]
    pub credential: String,

    /// Seconds between identity refreshes.
    #[serde(default = "ClientConfig::default_refresh_secs")]
    pub refresh_secs: u64,
}

impl CommonConfig for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Self::default_api_url(),
            credential: String::new(),
            refresh_secs: Self::default_refresh_secs(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        self.api_url = expandenv("api_url", &self.api_url)?;
        if self.api_url.is_empty() {
            bail!("api_url is required");
        }
        if Url::parse(&self.api_url).is_err() {
            bail!("invalid api_url '{}'", self.api_url);
        }

        self.credential = expandenv("credential", &self.credential)?;

        if self.refresh_secs == 0 {
            bail!("refresh_secs must be greater than 0");
        }

        Ok(())
    }
}

impl ClientConfig {
    fn default_api_url() -> String {
        String::from("http://127.0.0.1:3000")
    }

    fn default_refresh_secs() -> u64 {
        60
    }
}
