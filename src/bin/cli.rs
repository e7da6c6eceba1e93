use clap::{Parser, Subcommand};
use dynamcp::{builtins, config, mcp::McpServerInstance};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dynamcp-cli")]
#[command(about = "CLI tool for checking dynamcp configuration documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a configuration document and build every enabled server
    Check {
        /// Path to the configuration document
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },

    /// List every built-in handler export
    Handlers,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config: path } => {
            let document = match config::load_from_path(&path).await {
                Ok(document) => document,
                Err(err) => {
                    eprintln!("❌ Failed to load {}: {}", path.display(), err);
                    std::process::exit(1);
                }
            };

            let catalog = builtins::catalog();
            println!(
                "{:<24} {:<10} {:<8} {:<10} {:<8}",
                "Server", "Version", "Tools", "Resources", "Prompts"
            );
            println!("{}", "-".repeat(64));

            for descriptor in &document.servers {
                if !descriptor.enabled {
                    println!("{:<24} (disabled)", descriptor.name);
                    continue;
                }

                match McpServerInstance::build(descriptor, &catalog) {
                    Ok(instance) => {
                        let counts = instance.counts();
                        println!(
                            "{:<24} {:<10} {:<8} {:<10} {:<8}",
                            instance.name,
                            instance.version,
                            counts.tools,
                            counts.resources,
                            counts.prompts
                        );
                    }
                    Err(err) => {
                        eprintln!("❌ Server '{}' failed to build: {}", descriptor.name, err);
                        std::process::exit(1);
                    }
                }
            }

            println!("✅ Configuration is valid");
        }

        Commands::Handlers => {
            let catalog = builtins::catalog();
            println!("{:<28} {:<16} {:<10}", "Source", "Export", "Kind");
            println!("{}", "-".repeat(56));
            for entry in catalog.entries() {
                println!(
                    "{:<28} {:<16} {:<10}",
                    entry.locator, entry.entry, entry.convention
                );
            }
        }
    }

    Ok(())
}
