//! dlq - query the AFD delivery log from the command line.

mod sink;
mod timespec;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dlog_core::{LogType, Protocol, ProtocolMask};
use dlog_engine::{
    Criteria, JobEntry, NameDisplay, NumericFilter, Query, QueryConfig, QueryOutcome,
    StaticJobInfo, ViewFlags,
};
use sink::TerminalSink;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dlq", version, about = "Query the AFD delivery log")]
struct Args {
    /// Directory holding the rotated delivery log
    #[arg(long, default_value = "/var/log/afd")]
    log_dir: PathBuf,

    /// Base name of the rotated log files
    #[arg(long, default_value = "output.log")]
    base: String,

    /// Number of generations in the rotation ring
    #[arg(long, default_value_t = 10)]
    max_generations: u32,

    /// Window start: now, today, yesterday, -2h, 2025-01-12 [14:30:00]
    #[arg(long)]
    since: Option<String>,

    /// Window end, same formats as --since
    #[arg(long)]
    until: Option<String>,

    /// Keep following the live generation for new records
    #[arg(long)]
    follow: bool,

    /// File-name glob; a leading '!' excludes matches (repeatable)
    #[arg(long = "name")]
    names: Vec<String>,

    /// Recipient-host glob (repeatable)
    #[arg(long = "host")]
    hosts: Vec<String>,

    /// Directory glob (repeatable)
    #[arg(long = "dir")]
    dirs: Vec<String>,

    /// Directory id, hex (repeatable)
    #[arg(long = "dir-id", value_parser = parse_hex_u32)]
    dir_ids: Vec<u32>,

    /// Job id, hex (repeatable)
    #[arg(long = "job-id", value_parser = parse_hex_u64)]
    job_ids: Vec<u64>,

    /// User glob (repeatable)
    #[arg(long = "user")]
    users: Vec<String>,

    /// Size filter: '>1000', '<2048', '=42', '!=0'
    #[arg(long)]
    size: Option<NumericFilter>,

    /// Transfer-time filter in seconds, e.g. '<2.5'
    #[arg(long = "transfer-time")]
    transfer_time: Option<NumericFilter>,

    /// Protocols to include, comma separated (ftp,sftp,smtp,...)
    #[arg(long, value_delimiter = ',')]
    protocol: Vec<String>,

    /// Only records whose archive copy still exists
    #[arg(long)]
    archived_only: bool,

    /// Only received (input) records
    #[arg(long)]
    received_only: bool,

    /// Only delivered (output) records
    #[arg(long)]
    output_only: bool,

    /// Include confirmation records
    #[arg(long)]
    confirmation: bool,

    /// Render the remote file name instead of the local one
    #[arg(long)]
    remote_names: bool,

    /// Stop after this many rows; 0 is unbounded
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// JSON file mapping hex job ids to {user, mail_destination, dir,
    /// dir_id}, for the dir/user filters
    #[arg(long)]
    job_info: Option<PathBuf>,

    /// Field delimiter byte of the log (decimal)
    #[arg(long, default_value_t = 0x1f)]
    separator: u8,
}

fn parse_hex_u32(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s.trim().trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

fn parse_hex_u64(s: &str) -> Result<u64, String> {
    u64::from_str_radix(s.trim().trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

fn protocol_mask(names: &[String]) -> Result<ProtocolMask> {
    if names.is_empty() {
        return Ok(ProtocolMask::default());
    }

    let mut mask = ProtocolMask::empty();
    for name in names {
        let protocol =
            Protocol::from_name(name).ok_or_else(|| anyhow!("unknown protocol {name:?}"))?;
        mask |= protocol.mask_bit();
    }
    Ok(mask)
}

fn view_flags(args: &Args) -> ViewFlags {
    let mut view = ViewFlags::empty();
    if args.archived_only {
        view |= ViewFlags::ARCHIVED_ONLY;
    }
    if args.received_only {
        view |= ViewFlags::RECEIVED_ONLY;
    }
    if args.output_only {
        view |= ViewFlags::OUTPUT_ONLY;
    }
    if args.confirmation {
        view |= ViewFlags::CONFIRMATION;
    }
    view
}

fn criteria_from(args: &Args) -> Result<Criteria> {
    let start_time = args
        .since
        .as_deref()
        .map(timespec::parse_time_spec)
        .transpose()
        .context("bad --since")?;

    // Without --follow an open end means "up to now", so the query
    // terminates instead of tailing the live generation.
    let end_time = match args.until.as_deref() {
        Some(spec) => Some(timespec::parse_time_spec(spec).context("bad --until")?),
        None if args.follow => None,
        None => Some(timespec::parse_time_spec("now")?),
    };

    let mut criteria = Criteria::new()
        .with_file_names(args.names.clone())
        .with_hosts(args.hosts.clone())
        .with_directories(args.dirs.clone())
        .with_dir_ids(args.dir_ids.clone())
        .with_job_ids(args.job_ids.clone())
        .with_users(args.users.clone())
        .with_protocols(protocol_mask(&args.protocol)?)
        .with_view(view_flags(args))
        .with_list_limit(args.limit);

    if let Some(start) = start_time {
        criteria = criteria.with_start_time(start);
    }
    if let Some(end) = end_time {
        criteria = criteria.with_end_time(end);
    }
    if let Some(size) = args.size {
        criteria = criteria.with_size_filter(size);
    }
    if let Some(transfer_time) = args.transfer_time {
        criteria = criteria.with_transfer_time_filter(transfer_time);
    }
    if args.remote_names {
        criteria = criteria.with_name_display(NameDisplay::Remote);
    }

    Ok(criteria)
}

fn load_job_info(path: Option<&Path>) -> Result<StaticJobInfo> {
    let Some(path) = path else {
        return Ok(StaticJobInfo::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read job-info file {}", path.display()))?;
    let entries: HashMap<String, JobEntry> =
        serde_json::from_str(&text).context("malformed job-info file")?;

    let mut info = StaticJobInfo::default();
    for (id, entry) in entries {
        let job_id = parse_hex_u64(&id).map_err(|e| anyhow!("bad job id {id:?}: {e}"))?;
        info.insert(job_id, entry);
    }
    Ok(info)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let criteria = criteria_from(&args)?;
    let config = QueryConfig::new(&args.log_dir)
        .with_base_name(args.base.clone())
        .with_max_generations(args.max_generations);
    let log_type = LogType {
        sep: args.separator,
        ..LogType::default()
    };
    let job_info = load_job_info(args.job_info.as_deref())?;

    let stop = CancellationToken::new();
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            stop.cancel();
        });
    }

    let mut sink = TerminalSink::new(stop);
    let mut query = Query::new(criteria, config)
        .with_log_type(log_type)
        .with_job_info(job_info);

    let outcome = query.run(&mut sink).await?;
    eprintln!("{}", sink.summary());

    if outcome == QueryOutcome::Interrupted {
        std::process::exit(130);
    }
    Ok(())
}
