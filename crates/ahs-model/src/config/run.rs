use serde::{Deserialize, Serialize};

use crate::{
    domain::{DEFAULT_INPUT_TAG, DEFAULT_OUTPUT_TAG, DEFAULT_SEPARATOR},
    error::{ModelError, ModelResult},
    strategy::{BackoffStrategy, NamingStrategy},
};

/// Local files updated with the computed hostname, in addition to the kernel hostname.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistOptions {
    /// Write the hostname to `/etc/hostname`.
    #[serde(default)]
    pub hostname_file: bool,
    /// Map `127.0.0.1` to the hostname in `/etc/hosts`.
    #[serde(default)]
    pub hosts_file: bool,
}

/// Everything a single hostname computation needs.
///
/// `RunConfig` describes *which* tags feed and receive the hostname, *how* the suffix is
/// derived (`strategy`) and *whether* changes are applied (`dry_run`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    pub strategy: NamingStrategy,
    /// Tag whose value is the hostname base.
    pub input_tag: String,
    /// Tag updated with the computed hostname.
    pub output_tag: String,
    /// Placed between the base and the suffix.
    pub separator: String,
    /// Compute and log, but never apply.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub persist: PersistOptions,
    #[serde(default)]
    pub backoff: BackoffStrategy,
}

impl RunConfig {
    /// Config with default tag names and separator for the given strategy.
    pub fn new(strategy: NamingStrategy) -> Self {
        Self {
            strategy,
            input_tag: DEFAULT_INPUT_TAG.to_string(),
            output_tag: DEFAULT_OUTPUT_TAG.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            dry_run: false,
            persist: PersistOptions::default(),
            backoff: BackoffStrategy::default(),
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.input_tag.is_empty() {
            return Err(ModelError::Empty("input tag"));
        }
        if self.output_tag.is_empty() {
            return Err(ModelError::Empty("output tag"));
        }
        self.strategy.validate()?;
        self.backoff.validate()
    }

    /// Builder-style toggle for dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
