use clap::{Parser, Subcommand};
use serde_json::Value;
use url::Url;

#[derive(Parser)]
#[command(name = "views-cli")]
#[command(about = "Command-line client for the view counter service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000", env = "VIEWS_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the view count for a slug
    Get { slug: String },
    /// Record one view for a slug
    Incr { slug: String },
    /// Show storage diagnostics
    Debug,
    /// Fetch a page through the content proxy
    Page { page_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Get { slug } => client.get(endpoint(&cli.url, &["views", slug.as_str()])?).send().await?,
        Commands::Incr { slug } => client.post(endpoint(&cli.url, &["views", slug.as_str()])?).send().await?,
        Commands::Debug => client.get(endpoint(&cli.url, &["views", "debug"])?).send().await?,
        Commands::Page { page_id } => client.get(endpoint(&cli.url, &["pages", page_id.as_str()])?).send().await?,
    };
    print_response(res).await
}

/// Append percent-encoded path segments to the service URL.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("service URL cannot be a base: {}", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
