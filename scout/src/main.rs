use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod config;
mod context;
mod format;
mod logging;

/// Scout - Container Registry Search
///
/// Lists every image tag in a Docker/OCI registry with its digest and size.
#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control colored output: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List image tags with their digest and size
    #[command(visible_alias = "ls")]
    Images {
        /// Registry URL (e.g. https://registry.example.com)
        #[arg(long)]
        url: Option<String>,
        /// Credentials as user[:password]; prompts for the password if omitted
        #[arg(short, long)]
        user: Option<String>,
        /// Only search this image
        #[arg(short, long)]
        name: Option<String>,
        /// Output format: text, json, yaml
        #[arg(short, long)]
        output: Option<String>,
        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,
        /// Number of manifest workers
        #[arg(long)]
        workers: Option<usize>,
        /// Manifest requests per second
        #[arg(long)]
        rate: Option<u32>,
        /// Requests allowed in a burst
        #[arg(long)]
        burst: Option<u32>,
        /// Print text rows as they arrive instead of a sorted table
        #[arg(long)]
        unsorted: bool,
    },
    /// Display version information
    Version,
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    // Build context with precedence: defaults > config file > env vars > CLI flags
    let verbosity = context::VerbosityLevel::from_count(cli.verbose);
    let ctx = context::AppContext::build(format::ColorChoice::from(cli.color.as_str()), verbosity);
    logging::init(verbosity);

    if let Some(e) = &ctx.config_error {
        format::warning(
            &ctx,
            &format!(
                "Ignoring config file {}: {}",
                ctx.config_path.display(),
                e
            ),
        );
    }

    match cli.command {
        Commands::Images {
            url,
            user,
            name,
            output,
            insecure,
            workers,
            rate,
            burst,
            unsorted,
        } => {
            let args = commands::images::ImagesArgs {
                url,
                user,
                name,
                output,
                insecure,
                workers,
                rate,
                burst,
                unsorted,
            };
            commands::images::handlers::handle_images(&ctx, &args);
        }
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}
