use clap::{Parser, Subcommand};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "quill-cli")]
#[command(about = "Command-line client for the Quill content gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway is up
    Health,
    /// Generate a piece of content
    Generate {
        /// blog_post, article, social_media, script, ...
        #[arg(long, default_value = "blog_post")]
        content_type: String,
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "")]
        tone: String,
        /// Target length in words
        #[arg(long)]
        length: Option<u32>,
        #[arg(long, default_value = "")]
        context: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            println!("{} {}", res.status(), res.text().await?);
        }
        Commands::Generate {
            content_type,
            topic,
            tone,
            length,
            context,
        } => {
            let body = json!({
                "content_type": content_type,
                "topic": topic,
                "tone": tone,
                "length": length,
                "additional_context": context,
            });
            let res = client
                .post(format!("{}/api/generate", cli.url))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = res
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("60")
            .to_string();
        eprintln!("Rate limited: retry after {} seconds", retry_after);
        return Ok(());
    }
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
