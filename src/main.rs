use bye::cli::{decrypt_file, encrypt_file, show_info, DecryptOptions, EncryptOptions};
use bye::ConsolePrompter;
use clap::{Parser, Subcommand};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Version info from build.rs
const VERSION: &str = env!("BYE_VERSION");
const PROFILE: &str = env!("BYE_PROFILE");
const GIT_HASH: &str = env!("BYE_GIT_HASH");

fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} ({})", PROFILE, VERSION, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "bye")]
#[command(author, about = "Encrypt a file with a passphrase, leaving a hint for later", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file, replacing it with <file>.bye and .<file>.bye
    Encrypt {
        /// File to encrypt
        path: PathBuf,

        /// Overwrite existing .bye files
        #[arg(long)]
        force: bool,
    },

    /// Decrypt a .bye file, restoring the original
    Decrypt {
        /// Encrypted file (must end in .bye)
        path: PathBuf,

        /// Stop after this many wrong passphrases (default: keep asking)
        #[arg(long, env = "BYE_MAX_ATTEMPTS")]
        max_attempts: Option<NonZeroU32>,

        /// Overwrite an existing plaintext file
        #[arg(long)]
        force: bool,
    },

    /// Show the hint and parameters of a .bye file
    #[command(alias = "i")]
    Info {
        /// Encrypted file to inspect
        path: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(log_level: &str) {
    let level: tracing::Level = log_level.parse().unwrap_or(tracing::Level::WARN);
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("bye {}", get_version());
        return ExitCode::SUCCESS;
    }

    init_tracing(&cli.log_level);

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            eprintln!("{}", Cli::command().render_usage());
            return ExitCode::FAILURE;
        }
    };

    let mut prompter = ConsolePrompter::new();

    let result = match command {
        Commands::Encrypt { path, force } => {
            let options = EncryptOptions { force };
            encrypt_file(&path, &mut prompter, &options).map(|output| {
                println!("File successfully encrypted: {}", output.display());
            })
        }

        Commands::Decrypt {
            path,
            max_attempts,
            force,
        } => {
            let options = DecryptOptions {
                max_attempts,
                force,
            };
            decrypt_file(&path, &mut prompter, &options).map(|output| {
                println!("File successfully decrypted: {}", output.display());
            })
        }

        Commands::Info { path, json } => show_info(&path, json).map(|info| print!("{}", info)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
