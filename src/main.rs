use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use watermark_worker::config::{AwsConfig, Config};
use watermark_worker::constants::DEFAULT_CONFIG_PATH;
use watermark_worker::pipeline::{Pipeline, PipelineConfig};
use watermark_worker::queue::SqsQueue;
use watermark_worker::shutdown::ShutdownSignal;
use watermark_worker::storage::S3ObjectStore;
use watermark_worker::watermark::{TrueTypeFace, WatermarkRenderer};

/// Watermark worker - stamps uploaded images with their file name
#[derive(Parser, Debug)]
#[command(name = "watermark-worker")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .and_then(|config| config.validate().map(|()| config))
        .unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        });

    if let Err(e) = watermark_worker::logging::init_subscriber(&config.logging) {
        eprintln!("Failed to initialize logging subsystem: {}", e);
        std::process::exit(1);
    }

    tracing::info!(
        config_file = %args.config.display(),
        queue_url = %config.queue.queue_url,
        output_bucket = %config.output.bucket,
        output_prefix = %config.output.path_prefix,
        font_path = %config.watermark.font_path.display(),
        "Configuration loaded successfully"
    );

    if let Err(e) = run(args, config).await {
        tracing::error!(error = format!("{:#}", e), "Worker failed to start");
        std::process::exit(1);
    }
}

async fn run(args: Args, config: Config) -> anyhow::Result<()> {
    let face = TrueTypeFace::from_file(&config.watermark.font_path, config.watermark.font_size)
        .context("Failed to load watermark font")?;
    let options = config
        .watermark
        .render_options()
        .context("Invalid watermark settings")?;
    let renderer = WatermarkRenderer::new(Arc::new(face), options);

    if args.test {
        tracing::info!("Configuration test successful");
        return Ok(());
    }

    let sdk_config = load_sdk_config(&config.aws).await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(config.aws.use_path_style())
        .build();
    let store = S3ObjectStore::new(aws_sdk_s3::Client::from_conf(s3_config));
    let queue = SqsQueue::new(
        aws_sdk_sqs::Client::new(&sdk_config),
        config.queue.queue_url.clone(),
    );

    let shutdown = ShutdownSignal::new();
    shutdown
        .register_signal_handlers()
        .map_err(anyhow::Error::msg)?;

    let pipeline = Pipeline::new(
        Arc::new(queue),
        Arc::new(store),
        renderer,
        PipelineConfig::from_config(&config),
    );
    pipeline.run(&shutdown).await;

    Ok(())
}

async fn load_sdk_config(aws: &AwsConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = &aws.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }
    if let Some(endpoint) = &aws.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}
