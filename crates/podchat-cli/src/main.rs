use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "podchat")]
#[command(about = "podchat - chat history stored in a Solid pod", long_about = None)]
struct Cli {
    /// Directory holding config.toml and account.json
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Pod server base URL (overrides config.toml and PODCHAT_SERVER_URL)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account with a WebID and a pod, and remember it locally
    Register {
        /// Register a throw-away account with generated name and password
        #[arg(long, conflicts_with_all = ["name", "email", "password"])]
        random: bool,
        #[arg(long, required_unless_present = "random")]
        name: Option<String>,
        #[arg(long, required_unless_present = "random")]
        email: Option<String>,
        #[arg(long, required_unless_present = "random")]
        password: Option<String>,
    },
    /// Print the chat history
    List,
    /// Append a message to the chat history
    Append {
        #[arg(long, value_enum, default_value_t = RoleArg::Human)]
        role: RoleArg,
        content: String,
    },
    /// Delete the chat history
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    Human,
    Ai,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let context = commands::Context::load(cli.config_dir.as_deref(), cli.server.as_deref())?;

    match cli.command {
        Commands::Register {
            random,
            name,
            email,
            password,
        } => commands::register::run(&context, random, name, email, password).await?,
        Commands::List => commands::history::list(&context).await?,
        Commands::Append { role, content } => {
            commands::history::append(&context, role == RoleArg::Ai, content).await?
        }
        Commands::Clear => commands::history::clear(&context).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_register_requires_identity_or_random() {
        assert!(Cli::try_parse_from(["podchat", "register"]).is_err());
        assert!(Cli::try_parse_from(["podchat", "register", "--random"]).is_ok());
        assert!(Cli::try_parse_from(["podchat", "register", "--random", "--name", "x"]).is_err());
        assert!(
            Cli::try_parse_from([
                "podchat", "register", "--name", "a", "--email", "a@b.c", "--password", "p"
            ])
            .is_ok()
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "podchat",
            "append",
            "--role",
            "ai",
            "hello there",
            "--server",
            "http://localhost:3000",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://localhost:3000"));
        match cli.command {
            Commands::Append { role, content } => {
                assert_eq!(role, RoleArg::Ai);
                assert_eq!(content, "hello there");
            }
            _ => panic!("expected append"),
        }
    }
}
