use serde::{Deserialize, Serialize};

/// Site layout the normalizer needs to recognize local references.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Hostnames that refer to this site. Absolute URLs on these hosts are
    /// reduced to their path before classification.
    pub local_hosts: Vec<String>,
    /// Site-relative prefix under which `public://` files are served.
    pub public_prefix: String,
    /// Site-relative prefix under which `private://` files are served.
    pub private_prefix: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            local_hosts: vec!["localhost".into()],
            public_prefix: "/sites/default/files/".into(),
            private_prefix: "/system/files/".into(),
        }
    }
}

impl NormalizerConfig {
    /// Configuration for a site served from the given hostnames.
    pub fn for_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            local_hosts: hosts.into_iter().map(|h| h.into().to_ascii_lowercase()).collect(),
            ..Default::default()
        }
    }

    pub(crate) fn is_local_host(&self, host: &str) -> bool {
        self.local_hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(host))
    }
}
