//! The single-shot pipeline: resolve identity, read the base tag, compute the hostname,
//! apply it.
//!
//! Every read happens before the first write. The local hostname is applied before the
//! output tag is written; a failure in between is not rolled back.
use std::time::Instant;

use ahs_model::{InstanceIdentity, NamingStrategy, RunConfig, SequentialId};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    allocator::GapFillingAllocator,
    backoff::retry,
    error::CoreResult,
    host::{HostnameSink, validate_hostname},
    identity::{IdentityResolver, MetadataSource},
    naming::{SequentialNaming, hostname_with_instance_id},
    tags::TagStore,
};

/// Builds the tag store client once the instance identity (region) is known.
#[async_trait]
pub trait TagStoreConnector: Send + Sync {
    async fn connect(&self, identity: &InstanceIdentity) -> CoreResult<Box<dyn TagStore>>;
}

/// External systems the pipeline talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub metadata: &'a dyn MetadataSource,
    pub connector: &'a dyn TagStoreConnector,
    pub host: &'a dyn HostnameSink,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub identity: InstanceIdentity,
    pub hostname: String,
    /// Set in sequential mode only.
    pub sequential_id: Option<SequentialId>,
    /// `false` in dry-run mode.
    pub applied: bool,
}

/// Computes and applies the hostname described by `cfg`.
///
/// `started` is the process start instant, used to log the total run time.
pub async fn run(cfg: &RunConfig, deps: Collaborators<'_>, started: Instant) -> CoreResult<Outcome> {
    let res = execute(cfg, deps).await;
    debug!(elapsed = ?started.elapsed(), "executed, exiting");
    res
}

async fn execute(cfg: &RunConfig, deps: Collaborators<'_>) -> CoreResult<Outcome> {
    cfg.validate()?;

    let identity = IdentityResolver::new(deps.metadata, &cfg.backoff)
        .resolve()
        .await?;
    let store = connect(cfg, deps.connector, &identity).await?;

    let base = read_base(store.as_ref(), cfg, &identity.instance_id).await?;
    let (hostname, sequential_id) = compute(cfg, store.as_ref(), &identity, &base).await?;
    validate_hostname(&hostname)?;

    let applied = if cfg.dry_run {
        report_dry_run(cfg, sequential_id);
        false
    } else {
        apply(cfg, deps.host, store.as_ref(), &identity, &hostname, sequential_id).await?;
        true
    };

    Ok(Outcome {
        identity,
        hostname,
        sequential_id,
        applied,
    })
}

async fn connect(
    cfg: &RunConfig,
    connector: &dyn TagStoreConnector,
    identity: &InstanceIdentity,
) -> CoreResult<Box<dyn TagStore>> {
    debug!(region = %identity.region, "connecting to the tag store");
    retry(&cfg.backoff, "connect tag store", move || {
        connector.connect(identity)
    })
    .await
}

async fn read_base(store: &dyn TagStore, cfg: &RunConfig, instance_id: &str) -> CoreResult<String> {
    info!(tag = %cfg.input_tag, "querying input tag");
    let key = cfg.input_tag.as_str();
    let base = retry(&cfg.backoff, "read input tag", move || {
        store.read_tag(instance_id, key)
    })
    .await?;
    debug!(tag = key, value = %base, "found input tag");
    Ok(base)
}

async fn compute(
    cfg: &RunConfig,
    store: &dyn TagStore,
    identity: &InstanceIdentity,
    base: &str,
) -> CoreResult<(String, Option<SequentialId>)> {
    match &cfg.strategy {
        NamingStrategy::InstanceId { length } => {
            let hostname =
                hostname_with_instance_id(base, &identity.instance_id, &cfg.separator, *length)?;
            Ok((hostname, None))
        }
        NamingStrategy::Sequential {
            group_tag,
            sequential_id_tag,
            respect_azs,
        } => {
            if *respect_azs {
                warn!("respect-azs is accepted but does not partition allocation by availability zone");
            }

            let allocator = GapFillingAllocator::new(store, &cfg.backoff);
            let naming = SequentialNaming {
                separator: &cfg.separator,
                group_tag,
                sequential_id_tag,
            };
            let (hostname, id) = naming
                .hostname(base, &identity.instance_id, &allocator)
                .await?;
            Ok((hostname, Some(id)))
        }
    }
}

async fn apply(
    cfg: &RunConfig,
    host: &dyn HostnameSink,
    store: &dyn TagStore,
    identity: &InstanceIdentity,
    hostname: &str,
    sequential_id: Option<SequentialId>,
) -> CoreResult<()> {
    info!("setting instance hostname locally");
    host.set_hostname(hostname)?;

    if cfg.persist.hostname_file {
        info!("persisting hostname to /etc/hostname");
        host.persist_hostname_file(hostname)?;
    }
    if cfg.persist.hosts_file {
        info!("mapping 127.0.0.1 to the hostname in /etc/hosts");
        host.persist_hosts_entry(hostname)?;
    }

    let instance_id = identity.instance_id.as_str();
    let output_tag = cfg.output_tag.as_str();
    info!(tag = output_tag, "setting hostname on configured instance output tag");
    retry(&cfg.backoff, "write output tag", move || {
        store.write_tag(instance_id, output_tag, hostname)
    })
    .await?;

    if let (Some(id), NamingStrategy::Sequential { sequential_id_tag, .. }) =
        (sequential_id, &cfg.strategy)
    {
        info!(tag = %sequential_id_tag, sequential_id = id, "setting instance sequential id");
        let key = sequential_id_tag.as_str();
        let value = id.to_string();
        let value = value.as_str();
        retry(&cfg.backoff, "write sequential id tag", move || {
            store.write_tag(instance_id, key, value)
        })
        .await?;
    }
    Ok(())
}

fn report_dry_run(cfg: &RunConfig, sequential_id: Option<SequentialId>) {
    info!("setting instance hostname locally (dry-run)");
    if cfg.persist.hostname_file {
        info!("persisting hostname to /etc/hostname (dry-run)");
    }
    if cfg.persist.hosts_file {
        info!("mapping 127.0.0.1 to the hostname in /etc/hosts (dry-run)");
    }
    info!(tag = %cfg.output_tag, "setting hostname on configured instance output tag (dry-run)");
    if let (Some(id), NamingStrategy::Sequential { sequential_id_tag, .. }) =
        (sequential_id, &cfg.strategy)
    {
        info!(tag = %sequential_id_tag, sequential_id = id, "setting instance sequential id (dry-run)");
    }
}
