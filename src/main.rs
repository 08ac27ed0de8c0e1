// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # staticsend
//!
//! Command-line host for the resolution pipeline. Every `PATH` is resolved
//! concurrently against the configured mount, then printed in argument order:
//! the status line and headers (or one JSON object per path with `--json`),
//! followed by the body when `--body` is given.
//!
//! ```text
//! staticsend --root ./public -H "Range: bytes=0-99" /index.html
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{debug, error, info, LevelFilter};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::runtime::Builder;

use staticsend::util::format_file_size;
use staticsend::{send, Config, Exception, Request, SendOptions, SendResponse};

const DEFAULT_CONFIG: &str = "config/development.toml";

#[derive(Parser)]
#[command(name = "staticsend")]
#[command(about = "Resolve static file requests into status, headers and body", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Base directory, overrides `[send].root`
    #[arg(short, long)]
    root: Option<String>,

    /// Request header as "Name: value", may be repeated
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Print one JSON object per path
    #[arg(long)]
    json: bool,

    /// Also print the response body
    #[arg(long)]
    body: bool,

    /// Request paths, e.g. /index.html
    #[arg(required = true)]
    paths: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut config, config_note) = match &cli.config {
        Some(file) => match Config::from_toml(file) {
            Ok(config) => (config, format!("Loaded {}", file)),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::from(2);
            }
        },
        None => match Config::from_toml(DEFAULT_CONFIG) {
            Ok(config) => (config, format!("Loaded {}", DEFAULT_CONFIG)),
            Err(e) => (Config::default(), format!("Using defaults: {}", e)),
        },
    };

    init_logging(config.log_config());
    debug!("{}", config_note);

    if let Some(root) = &cli.root {
        config.set_root(root);
    }
    let options = match config.send_options() {
        Ok(options) => Arc::new(options),
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Couldn't start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(cli, options, config.chunk_size()))
}

fn init_logging(file: &str) {
    if log4rs::init_file(file, Default::default()).is_ok() {
        return;
    }
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {m}{n}")))
        .build();
    let fallback = LogConfig::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Info));
    match fallback {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("Couldn't initialise logging: {}", e);
            }
        }
        Err(e) => eprintln!("Couldn't build logging config: {}", e),
    }
}

async fn run(cli: Cli, options: Arc<SendOptions>, chunk_size: usize) -> ExitCode {
    let mut handles = Vec::with_capacity(cli.paths.len());
    for (id, path) in cli.paths.iter().enumerate() {
        let request = match Request::from_header_lines(path, &cli.headers) {
            Ok(request) => request.with_id(id as u128),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::from(2);
            }
        };
        let options = Arc::clone(&options);
        handles.push(tokio::spawn(async move { send(&request, &options).await }));
    }
    info!("Resolving {} path(s)", handles.len());

    let mut failed = false;
    for (path, handle) in cli.paths.iter().zip(handles) {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Task for {} failed: {}", path, e);
                failed = true;
                continue;
            }
        };
        let result = match outcome {
            Ok(response) => print_response(path, &response, &cli, chunk_size).await,
            Err(e) => {
                failed = true;
                print_fatal(path, &e, cli.json);
                Ok(())
            }
        };
        if let Err(e) = result {
            error!("Couldn't print response for {}: {}", path, e);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn print_response(
    path: &str,
    response: &SendResponse,
    cli: &Cli,
    chunk_size: usize,
) -> std::io::Result<()> {
    if cli.json {
        let headers: Map<String, Value> = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), Value::from(value)))
            .collect();
        let mut object = json!({
            "path": path,
            "status": response.status(),
            "reason": response.reason(),
            "headers": headers,
        });
        if cli.body {
            let body = match response.stream() {
                Some(stream) => String::from_utf8_lossy(&stream.read_all().await?).into_owned(),
                None => String::new(),
            };
            object["body"] = Value::from(body);
        }
        println!("{}", object);
        return Ok(());
    }

    println!("{} {} {}", path, response.status(), response.reason());
    for (name, value) in response.headers().iter() {
        println!("{}: {}", name, value);
    }
    println!();

    if cli.body {
        if let Some(stream) = response.stream() {
            let sent = copy_body(stream, chunk_size).await?;
            debug!("Wrote {} of body for {}", format_file_size(sent), path);
            println!();
        }
    }
    Ok(())
}

async fn copy_body(stream: &staticsend::ByteStream, chunk_size: usize) -> std::io::Result<u64> {
    let mut reader = stream.open().await?;
    let mut stdout = tokio::io::stdout();
    let mut buffer = vec![0u8; chunk_size];
    let mut total = 0u64;
    loop {
        match reader.read(&mut buffer).await? {
            0 => break,
            n => {
                stdout.write_all(&buffer[..n]).await?;
                total += n as u64;
            }
        }
    }
    stdout.flush().await?;
    Ok(total)
}

fn print_fatal(path: &str, e: &Exception, as_json: bool) {
    error!("{}: {}", path, e);
    if as_json {
        println!("{}", json!({ "path": path, "error": e.to_string() }));
    } else {
        eprintln!("{}: {}", path, e);
    }
}
