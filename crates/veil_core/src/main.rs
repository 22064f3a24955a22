use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use clap::Parser;
use veil_core::{read_body, send_with, RequestParams};

/// HTTPS client whose TLS handshake looks like a real browser's, not like an
/// HTTP library's. Status line and headers go to stderr, the raw body to
/// stdout, so the body can be piped cleanly.
#[derive(Parser, Debug)]
#[command(name = "veil", version, about)]
struct Args {
    /// Target URL (exactly one)
    url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// TLS fingerprint profile: Chrome, Firefox, iOS, Safari, Random
    #[arg(short = 'p', long, default_value = "Chrome")]
    profile: String,

    /// Request body for POST, PUT, etc.
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Extra header in 'Key: Value' form (repeatable)
    #[arg(short = 'H', long = "header", value_name = "KEY: VALUE")]
    headers: Vec<String>,

    /// Verify the server certificate chain instead of accepting anything
    #[arg(long)]
    verify_certs: bool,
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("header must be in 'Key: Value' format: {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("header has an empty name: {raw:?}");
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut headers = HashMap::new();
    for raw in &args.headers {
        let (key, value) = parse_header(raw)?;
        headers.insert(key, value);
    }

    let params = RequestParams {
        url: args.url,
        method: args.method,
        profile: args.profile,
        headers,
        body: args.data,
    };

    let (response, deadline) = send_with(&params, |connector| {
        connector.verify_certificates(args.verify_certs)
    })
    .await?;

    // Status and headers on stderr so the body alone lands on stdout.
    eprintln!("{:?} {}", response.version(), response.status());
    for (name, value) in response.headers() {
        eprintln!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    eprintln!();

    let body = read_body(response.into_body(), deadline).await?;
    std::io::stdout().write_all(&body)?;

    Ok(())
}
