//! `ajax` command line client.
//!
//! Sends one request through the dispatcher and prints the response body.
//!
//! ```text
//! ajax http://localhost:3000/search -d q=rust -d page=2 --data-type json
//! ajax http://localhost:3000/items -X post --json-data '{"name":"x"}'
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;

use ajax_dispatch::config::{load_settings, DispatcherSettings};
use ajax_dispatch::observability::logging::init_logging;
use ajax_dispatch::{Dispatcher, Outcome, RequestConfig, RequestData, ResponseValue, Transport};

#[derive(Parser)]
#[command(name = "ajax")]
#[command(about = "Send one HTTP request and print the response", long_about = None)]
struct Cli {
    /// Request url, absolute or relative to the configured base url
    url: String,

    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Key/value payload entry (repeatable)
    #[arg(short, long = "data", value_name = "KEY=VALUE", value_parser = parse_pair)]
    data: Vec<(String, String)>,

    /// Payload sent verbatim
    #[arg(long, value_name = "STRING", conflicts_with_all = ["data", "json_data"])]
    raw_data: Option<String>,

    /// JSON object payload, implies an application/json content type
    #[arg(long, value_name = "JSON", conflicts_with = "data")]
    json_data: Option<String>,

    #[arg(short = 't', long)]
    content_type: Option<String>,

    /// Extra request header (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Response interpretation: text, json, arraybuffer, blob, document
    #[arg(long)]
    data_type: Option<String>,

    /// Wait for completion inside the dispatch call
    #[arg(long)]
    sync: bool,

    #[arg(short, long)]
    user: Option<String>,

    #[arg(long, requires = "user")]
    password: Option<String>,

    /// Send and store cookies
    #[arg(long)]
    with_credentials: bool,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_pair(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", input))
}

fn parse_header(input: &str) -> Result<(String, String), String> {
    input
        .split_once(':')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected `Name: value`, got `{}`", input))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => DispatcherSettings::default(),
    };
    init_logging(&settings.observability)?;

    tracing::debug!(
        transports = ?settings.transports,
        base_url = ?settings.base_url,
        "Settings loaded"
    );

    let dispatcher = Dispatcher::new(settings)?;
    let request = build_request(&cli)?;

    match dispatcher.dispatch(request).await?.await? {
        Outcome::Success(value) => {
            print_value(&value)?;
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Failed { .. } => Ok(ExitCode::FAILURE),
    }
}

fn build_request(cli: &Cli) -> Result<RequestConfig, Box<dyn Error>> {
    let mut request = RequestConfig::new(cli.url.clone())
        .method(cli.method.clone())
        .with_credentials(cli.with_credentials)
        .on_error(report_error);

    if !cli.data.is_empty() {
        request = request.params(cli.data.iter().cloned());
    }
    if let Some(raw) = &cli.raw_data {
        request = request.data(raw.as_str());
    }
    if let Some(json) = &cli.json_data {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => request = request.data(RequestData::Params(map)),
            _ => return Err("--json-data must be a JSON object".into()),
        }
        if cli.content_type.is_none() {
            request = request.content_type("application/json");
        }
    }
    if let Some(content_type) = &cli.content_type {
        request = request.content_type(content_type.clone());
    }
    for (name, value) in &cli.headers {
        request = request.header(name.clone(), value.clone());
    }
    if let Some(data_type) = &cli.data_type {
        request = request.data_type(data_type.clone());
    }
    if let Some(user) = &cli.user {
        request = request.credentials(user.clone(), cli.password.clone());
    }
    if cli.sync {
        request = request.synchronous();
    }

    Ok(request)
}

fn report_error(transport: &dyn Transport, status: u16, status_text: &str) {
    eprintln!("Error: server returned {} {}", status, status_text);
    if let Some(content_type) = transport.response_header("content-type") {
        eprintln!("Content-Type: {}", content_type);
    }
}

fn print_value(value: &ResponseValue) -> Result<(), Box<dyn Error>> {
    match value {
        ResponseValue::Json(json) => println!("{}", serde_json::to_string_pretty(json)?),
        ResponseValue::Text(text) => println!("{}", text),
        ResponseValue::Binary(bytes) => println!("<{} bytes>", bytes.len()),
    }
    Ok(())
}
