use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "dea-ad",
    about = "DeaGrid — inspect and evaluate node capacity advertisements",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to deagrid.toml (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an advertisement payload and print its contents
    Inspect {
        /// JSON file holding one advertisement payload
        file: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Check whether the advertising node can take an instance
    Check {
        /// JSON file holding one advertisement payload
        file: String,
        /// Memory the instance needs, in MB
        #[arg(short, long)]
        memory: u64,
        /// Stack the instance runs on
        #[arg(short, long)]
        stack: String,
        /// Also report how many instances of this app the node runs
        #[arg(short, long)]
        app: Option<String>,
    },
    /// Report whether the advertisement would be expired after some time.
    ///
    /// Durations accept "10s", "500ms", "1m" or bare seconds.
    Simulate {
        /// JSON file holding one advertisement payload
        file: String,
        /// Time elapsed since receipt
        #[arg(short, long)]
        elapsed: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deagrid_advert=info".parse()?)
        )
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let report = match cli.command {
        Commands::Inspect { file, format } => commands::inspect::inspect(&file, &format)?,
        Commands::Check {
            file,
            memory,
            stack,
            app,
        } => commands::check::check(&file, memory, &stack, app.as_deref())?,
        Commands::Simulate { file, elapsed } => {
            commands::simulate::simulate(&file, &elapsed, &config)?
        }
    };

    println!("{report}");
    Ok(())
}
