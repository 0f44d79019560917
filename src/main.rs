mod cli;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "extracto=warn",
        1 => "extracto=debug",
        _ => "extracto=trace",
    };
    let filter = EnvFilter::try_from_env("EXTRACTO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let dictionary = cli.dictionary.as_deref();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Headers { source, json } => cli::headers::run(&source, json),
        Commands::Preview {
            source,
            mapping,
            json,
        } => cli::preview::run(&source, &mapping, dictionary, json),
        Commands::Import {
            source,
            mapping,
            db,
        } => cli::import::run(&source, &mapping, dictionary, db),
        Commands::Categories { json } => cli::categories::list(dictionary, json),
        Commands::Categorize { text, label } => cli::categories::categorize(dictionary, &text, label),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
