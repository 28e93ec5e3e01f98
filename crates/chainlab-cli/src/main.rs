use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "chainlab-cli")]
#[command(about = "CLI client for the chainlab blockchain node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all blocks in the node's chain
    Blocks {
        /// Node base URL (e.g. http://127.0.0.1:3000)
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        node: String,
    },
    /// Fetch a single block by chain index
    Block {
        /// Node base URL (e.g. http://127.0.0.1:3000)
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        node: String,
        /// Chain index of the block
        #[arg(long)]
        index: usize,
    },
    /// Mine a new block with the given JSON payload
    Mine {
        /// Node base URL (e.g. http://127.0.0.1:3000)
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        node: String,
        /// Block payload as JSON, e.g. '{"msg":"hello"}'
        #[arg(long)]
        data: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    match cli.cmd {
        Command::Blocks { node } => {
            let res = client.get(format!("{node}/api/blocks")).send().await?;
            print_response(res).await?;
        }
        Command::Block { node, index } => {
            let res = client
                .get(format!("{node}/api/blocks/{index}"))
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Mine { node, data } => {
            let data: Value = serde_json::from_str(&data)?;
            let res = client
                .post(format!("{node}/api/blocks/mine"))
                .json(&serde_json::json!({ "data": data }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}
