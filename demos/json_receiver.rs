use clap::Parser;
use json_livelink::{AnimationFrameData, Endpoint, JsonLiveLinkSource, PipelineSink, SkeletonStaticData, SourceConfig, SourceStatus, SubjectKey};
use std::sync::Arc;
use anyhow::anyhow;
use tracing::{info, Level};
use uuid::Uuid;

/// Listens for JSON animation datagrams and logs every update
#[derive(Parser)]
struct Args {
    /// e.g. 0.0.0.0:54321, or a multicast group like 239.0.0.1:54321
    endpoint: String,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,

    #[clap(long, default_value_t = false)]
    very_verbose: bool,
}

struct LoggingSink;

impl PipelineSink for LoggingSink {
    fn push_static(&self, subject_key: SubjectKey, static_data: SkeletonStaticData) {
        info!("{:?}: bones {:?}, parents {:?}, properties {:?}", subject_key, static_data.bone_names, static_data.bone_parents, static_data.property_names);
    }

    fn push_frame(&self, subject_key: SubjectKey, frame_data: AnimationFrameData) {
        info!("{:?}: {} transforms, values {:?}", subject_key, frame_data.transforms.len(), frame_data.property_values);
    }
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match (args.verbose, args.very_verbose) {
        (_, true) => Level::TRACE,
        (true, _) => Level::DEBUG,
        (false, false) => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .ok();

    let endpoint: Endpoint = args.endpoint.parse()?;
    let source = JsonLiveLinkSource::new(SourceConfig::new(endpoint), Arc::new(LoggingSink), Uuid::new_v4());
    if source.status() == SourceStatus::NotReady {
        return Err(anyhow!("unable to listen on {}: {}", endpoint, source.status()));
    }

    info!("{} on {:?} - press Ctrl-C to stop", source.source_type(), source.local_addr());
    tokio::signal::ctrl_c().await?;

    let num_subjects = source.subject_registry().len();
    source.shutdown().await;
    info!("received {} distinct subjects", num_subjects);
    Ok(())
}
