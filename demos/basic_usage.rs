use claude_direct::{ClaudeDirectProvider, GenerationOptions};
use dotenv::dotenv;
use futures::StreamExt;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if std::env::var("CLAUDE_SESSION_KEY").is_err() {
        println!("Please set the CLAUDE_SESSION_KEY environment variable");
        return Ok(());
    }
    let provider = ClaudeDirectProvider::from_env()?;

    let prompt = "Explain quantum computing in simple terms";
    println!("Prompt: {prompt}");
    println!("\nGenerating response...");

    let options = GenerationOptions::new()
        .system_prompt(
            "You are a helpful AI assistant that explains complex topics in simple terms.",
        )
        .temperature(0.7)
        .max_tokens(500);
    let response = provider.generate(prompt, &options).await?;

    println!("\nResponse:");
    println!("{response}");

    let prompt = "Write a short poem about technology";
    println!("\nPrompt: {prompt}");
    println!("\nStreaming response...");

    let options = GenerationOptions::new()
        .system_prompt("You are a creative AI assistant that writes poetry.")
        .temperature(0.9)
        .max_tokens(200);
    let mut stream = provider.stream_generate(prompt, &options).await?;

    while let Some(chunk) = stream.next().await {
        print!("{}", chunk?);
        io::stdout().flush()?;
    }

    println!("\n\nDone!");

    Ok(())
}
