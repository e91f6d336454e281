use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use sfs_client::{ClientConfig, LogData, LogSeverity, ProductRequest, RequestParams, SfsClient};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Parser)]
#[command(name = "sfs-client-tool", version = env!("CARGO_PKG_VERSION"), about = "Query the SFS content service for a product", long_about = None)]
struct Args {
    /// Product to resolve.
    #[arg(short, long)]
    product: String,

    #[arg(short, long)]
    account_id: String,

    /// Resolve an app product with its prerequisites.
    #[arg(long)]
    is_app: bool,

    /// Defaults to "storeapps" with --is-app, "default" otherwise.
    #[arg(long)]
    instance_id: Option<String>,

    #[arg(short, long)]
    namespace: Option<String>,

    /// Send requests to this URL instead of the account's endpoint.
    #[arg(long)]
    custom_url: Option<String>,

    /// Targeting attribute, repeatable.
    #[arg(long = "attribute", value_name = "KEY=VALUE", value_parser = parse_attribute)]
    attributes: Vec<(String, String)>,

    /// Correlation vector to extend.
    #[arg(long)]
    base_cv: Option<String>,

    #[arg(long)]
    proxy: Option<String>,

    /// Fail on the first retriable error.
    #[arg(long)]
    no_retry: bool,

    /// Print every log record of the client.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_attribute(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{s}`")),
    }
}

fn print_record(data: &LogData<'_>, verbose: bool) {
    let severity = match data.severity {
        LogSeverity::Error => style("error").red().bold(),
        LogSeverity::Warning => style("warn").yellow().bold(),
        LogSeverity::Info if verbose => style("info").green(),
        LogSeverity::Verbose if verbose => style("debug").dim(),
        _ => return,
    };
    eprintln!(
        "{} {severity} {} {}",
        style(data.time.format("%H:%M:%S%.3f")).dim(),
        data.message,
        style(format!("[{}:{}]", data.file, data.line)).dim()
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Client records go through the callback; tracing covers the HTTP stack.
    let level = if args.verbose { "debug,sfs_client=off" } else { "warn,sfs_client=off" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let instance_id = args
        .instance_id
        .clone()
        .unwrap_or_else(|| if args.is_app { "storeapps" } else { "default" }.to_string());

    let verbose = args.verbose;
    let mut config = ClientConfig::new(&args.account_id)
        .instance_id(instance_id)
        .log_callback(Box::new(move |data: &LogData<'_>| print_record(data, verbose)));
    if let Some(namespace) = &args.namespace {
        config = config.name_space(namespace);
    }

    let mut client = SfsClient::new(config).context("Failed to create the client")?;
    if let Some(url) = &args.custom_url {
        client.set_custom_base_url(url);
    }

    let request = args
        .attributes
        .iter()
        .fold(ProductRequest::new(&args.product), |request, (key, value)| {
            request.attribute(key, value)
        });
    let mut params = RequestParams::new(request).retry_on_error(!args.no_retry);
    if let Some(cv) = &args.base_cv {
        params = params.base_cv(cv);
    }
    if let Some(proxy) = &args.proxy {
        params = params.proxy(proxy);
    }

    let output = if args.is_app {
        let contents = client
            .get_latest_app_download_info(&params)
            .with_context(|| format!("Failed to get download info of app [{}]", args.product))?;
        serde_json::to_string_pretty(&contents)?
    } else {
        let contents = client
            .get_latest_download_info(&params)
            .with_context(|| format!("Failed to get download info of [{}]", args.product))?;
        serde_json::to_string_pretty(&contents)?
    };
    println!("{output}");

    Ok(())
}
