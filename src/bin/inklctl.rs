use std::path::PathBuf;

use clap::{Parser, Subcommand};
use inklings::config::ProviderKind;
use inklings::image::decode_data_uri;
use inklings::{Config, Generator, PromptComposer};

#[derive(Parser, Debug)]
#[command(name = "inklctl", about = "CLI for the Inklings coloring page generator", version)]
struct Cli {
    /// Override INKLINGS_PROVIDER (inference, space-queue, space-call, mock)
    #[arg(global = true, long)]
    provider: Option<String>,

    /// Override HF_MODEL
    #[arg(global = true, long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a coloring page and save it to disk
    Generate {
        /// What to draw, e.g. "a dragon flying over a castle"
        #[arg(long, short)]
        prompt: String,
        /// Output path (defaults to ./inkling.png or ./inkling.jpg)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Print the full prompt that would be sent to the provider
    Compose {
        #[arg(long, short)]
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    Config::dotenv_load();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compose { prompt } => match PromptComposer::compose(&prompt) {
            Ok(composed) => {
                println!("{}", composed.full());
                Ok(())
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(2);
            }
        },
        Commands::Generate { prompt, out } => {
            let mut conf = Config::new()?;
            if let Some(provider) = cli.provider {
                conf.provider = provider.parse::<ProviderKind>()?;
            }
            if let Some(model) = cli.model {
                conf.hf_model = model;
            }

            let composed = match PromptComposer::compose(&prompt) {
                Ok(composed) => composed,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(2);
                }
            };

            let generator = Generator::from_config(&conf)?;
            eprintln!(
                "Generating with {} ({})...",
                generator.provider_name(),
                generator.model()
            );
            let image = match generator.render(&composed).await {
                Ok(image) => image,
                Err(e) => {
                    eprintln!("Error [{}]: {}", e.kind(), e);
                    std::process::exit(1);
                }
            };

            let (mime, bytes) = decode_data_uri(&image.data_uri)?;
            let path = out.unwrap_or_else(|| PathBuf::from(default_file_name(&mime)));
            tokio::fs::write(&path, &bytes).await?;
            println!("Saved {} ({} bytes)", path.display(), bytes.len());
            Ok(())
        }
    }
}

fn default_file_name(mime: &str) -> &'static str {
    if mime == "image/jpeg" {
        "inkling.jpg"
    } else {
        "inkling.png"
    }
}
