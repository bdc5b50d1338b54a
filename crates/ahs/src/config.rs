use anyhow::Context;
use clap::{Parser, Subcommand};

use ahs_aws::DEFAULT_IMDS_ENDPOINT;
use ahs_model::{
    DEFAULT_GROUP_TAG, DEFAULT_INPUT_TAG, DEFAULT_OUTPUT_TAG, DEFAULT_SEPARATOR,
    DEFAULT_SEQUENTIAL_ID_TAG, DEFAULT_SUFFIX_LENGTH, NamingStrategy, PersistOptions, RunConfig,
};
use ahs_observe::{LoggerConfig, LoggerFormat, LoggerLevel, LoggerTimeZone};

/// Command line of the `ahs` binary.
///
/// Every flag can also be set through its `AHS_*` environment variable, which is how
/// instance user-data usually drives it.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ahs",
    version,
    about = "Sets the hostname of an EC2 instance from its tags"
)]
pub struct CliArgs {
    /// Compute the hostname and log what would change, without applying anything.
    #[arg(long, global = true, env = "AHS_DRY_RUN")]
    pub dry_run: bool,

    /// Tag whose value is the hostname base.
    #[arg(long, global = true, env = "AHS_INPUT_TAG", default_value = DEFAULT_INPUT_TAG)]
    pub input_tag: String,

    /// Tag updated with the computed hostname.
    #[arg(long, global = true, env = "AHS_OUTPUT_TAG", default_value = DEFAULT_OUTPUT_TAG)]
    pub output_tag: String,

    /// Separator placed between the base and the suffix.
    #[arg(long, global = true, env = "AHS_SEPARATOR", default_value = DEFAULT_SEPARATOR)]
    pub separator: String,

    /// Log filter, e.g. `info` or `ahs_core=debug,info`. `fatal` and `panic` mean `error`.
    #[arg(long, global = true, env = "AHS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format: `text` or `json`.
    #[arg(long, global = true, env = "AHS_LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    /// Timezone of log timestamps: `utc` or `local`.
    #[arg(long, global = true, env = "AHS_LOG_TIMEZONE", default_value = "utc")]
    pub log_timezone: LoggerTimeZone,

    /// Also write the hostname to /etc/hostname.
    #[arg(long, global = true, env = "AHS_PERSIST_HOSTNAME")]
    pub persist_hostname: bool,

    /// Also map 127.0.0.1 to the hostname in /etc/hosts.
    #[arg(long, global = true, env = "AHS_PERSIST_HOSTS")]
    pub persist_hosts: bool,

    /// Base URL of the instance metadata service.
    #[arg(long, global = true, env = "AHS_METADATA_ENDPOINT", default_value = DEFAULT_IMDS_ENDPOINT)]
    pub metadata_endpoint: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Suffix the base with characters of the instance id (`web` → `web-01234`).
    InstanceId {
        /// Number of instance-id characters to keep.
        #[arg(long, env = "AHS_INSTANCE_ID_LENGTH", default_value_t = DEFAULT_SUFFIX_LENGTH)]
        length: usize,
    },
    /// Suffix the base with the lowest free number of the instance group (`web` → `web-3`).
    Sequential {
        /// Tag whose value identifies the instance group.
        #[arg(long, env = "AHS_INSTANCE_GROUP_TAG", default_value = DEFAULT_GROUP_TAG)]
        instance_group_tag: String,

        /// Tag storing the allocated number on each instance.
        #[arg(long, env = "AHS_INSTANCE_SEQUENTIAL_ID_TAG", default_value = DEFAULT_SEQUENTIAL_ID_TAG)]
        instance_sequential_id_tag: String,

        /// Accepted for compatibility; numbers are not partitioned by availability zone.
        #[arg(long, env = "AHS_RESPECT_AZS")]
        respect_azs: bool,
    },
}

impl From<Command> for NamingStrategy {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::InstanceId { length } => NamingStrategy::InstanceId { length },
            Command::Sequential {
                instance_group_tag,
                instance_sequential_id_tag,
                respect_azs,
            } => NamingStrategy::Sequential {
                group_tag: instance_group_tag,
                sequential_id_tag: instance_sequential_id_tag,
                respect_azs,
            },
        }
    }
}

/// Validated settings of one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub run: RunConfig,
    pub logger: LoggerConfig,
    pub metadata_endpoint: String,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let run = RunConfig {
            strategy: args.command.into(),
            input_tag: args.input_tag,
            output_tag: args.output_tag,
            separator: args.separator,
            dry_run: args.dry_run,
            persist: PersistOptions {
                hostname_file: args.persist_hostname,
                hosts_file: args.persist_hosts,
            },
            backoff: Default::default(),
        };
        run.validate().context("invalid configuration")?;

        let logger = LoggerConfig {
            format: args.log_format,
            level: LoggerLevel::new(log_filter(&args.log_level))?,
            tz: args.log_timezone,
            ..Default::default()
        };

        if args.metadata_endpoint.trim().is_empty() {
            anyhow::bail!("metadata endpoint must not be empty");
        }

        Ok(Self {
            run,
            logger,
            metadata_endpoint: args.metadata_endpoint,
        })
    }
}

/// Rewrites the `fatal` and `panic` levels, which `tracing` lacks, to `error`.
fn log_filter(raw: &str) -> String {
    fn level(l: &str) -> &str {
        if l.eq_ignore_ascii_case("fatal") || l.eq_ignore_ascii_case("panic") {
            "error"
        } else {
            l
        }
    }

    raw.split(',')
        .map(|directive| match directive.rsplit_once('=') {
            Some((target, l)) => format!("{target}={}", level(l)),
            None => level(directive).to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}
