use clap::{Parser, Subcommand};
use shortify_extractor::Extractor;

#[derive(Debug, Parser)]
#[command(name = "shortify")]
#[command(about = "Extract normalized product data from Temu/Amazon/Walmart URLs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract a product from a product page URL.
    Extract {
        /// Product page URL (scheme optional).
        url: String,

        /// Restrict extraction to Temu URLs (the non-premium tier).
        #[arg(long)]
        temu_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract { url, temu_only } => {
            let extractor = Extractor::new(!temu_only)?;
            let product = extractor.extract_product(&url).await?;

            if let Some(warning) = product.extraction_warning() {
                eprintln!("warning: {warning}");
            }
            println!("{}", serde_json::to_string_pretty(&product)?);
        }
    }

    Ok(())
}
