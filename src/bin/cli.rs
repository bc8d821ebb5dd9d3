use anyhow::Context;
use clap::{Parser, Subcommand};
use specmcp::{
    config::Config,
    models::ParamLocation,
    services::{SpecFetcher, SpecSource, ToolGenerator},
};

#[derive(Parser)]
#[command(name = "specmcp-cli")]
#[command(about = "Inspect the tool catalogue an upstream API would produce", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tools generated from the upstream interface description
    Tools {
        /// Print each tool's input schema
        #[arg(short, long)]
        schema: bool,
    },

    /// Print the upstream API version token
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.config.validate()?;
    let fetcher = SpecFetcher::from_config(&cli.config);

    match cli.command {
        Commands::Tools { schema } => {
            let description = fetcher
                .fetch_description()
                .await
                .with_context(|| format!("Failed to load {}", fetcher.spec_url()))?;
            let operations = ToolGenerator::generate(&description)?;

            println!(
                "{} tools from {} endpoints",
                operations.len(),
                description.endpoint_count()
            );
            println!("{:<40} {:<8} {:<50}", "Tool", "Method", "Path");
            println!("{}", "-".repeat(98));
            for operation in &operations {
                println!(
                    "{:<40} {:<8} {:<50}",
                    operation.tool_name,
                    operation.method.as_str(),
                    operation.path
                );
                if schema {
                    let params: Vec<String> = [
                        ParamLocation::Path,
                        ParamLocation::Query,
                        ParamLocation::Header,
                    ]
                    .into_iter()
                    .flat_map(|loc| {
                        operation
                            .params_in(loc)
                            .map(move |p| format!("{}:{}", loc.as_str(), p.name))
                    })
                    .collect();
                    if !params.is_empty() {
                        println!("    params: {}", params.join(", "));
                    }
                    println!(
                        "    {}",
                        serde_json::to_string_pretty(&operation.input_schema)?
                            .replace('\n', "\n    ")
                    );
                }
            }
        }

        Commands::Version => match fetcher.fetch_version().await {
            Ok(token) => println!("{}", token),
            Err(err) => {
                eprintln!("❌ Failed to fetch version from {}: {}", fetcher.version_url(), err);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
