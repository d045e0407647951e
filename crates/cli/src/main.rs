mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use commands::ConfigArgs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sitemap-kit")]
#[command(version, about = "Sitemap generator for the Web3Fruity content site", long_about = None)]
struct Cli {
    /// Log progress at info level (otherwise RUST_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Fetch content and write sitemap files to the public directory
    Generate {
        #[command(flatten)]
        config: ConfigArgs,

        /// Output directory (overrides site.public_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not write robots.txt
        #[arg(long)]
        no_robots: bool,
    },

    /// Fetch every category and report items that would be dropped
    Validate {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Serve sitemap.xml and robots.txt, regenerating through the cache
    Serve {
        #[command(flatten)]
        config: ConfigArgs,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Generate {
            config,
            output,
            no_robots,
        } => commands::generate::run(config, output, !no_robots).await,
        Command::Validate { config } => commands::validate::run(config).await,
        Command::Serve { config, port } => commands::serve::run(config, port).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sitemap-kit", &mut io::stdout());
            Ok(())
        }
    }
}
