mod error;
mod orchestrator;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use error::CliError;
use orchestrator::Orchestrator;

#[derive(Debug, Parser)]
#[command(name = "billsim-cli")]
#[command(about = "Legislative bill similarity command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute bill-to-bill similarity scores over discoverable bills
    Compare {
        /// Number of bills to sample; <= 0 processes every bill
        #[arg(long, default_value_t = -1)]
        max: i64,
    },
    /// Index discoverable bills into the search engine
    Index {
        /// Re-upsert documents that already exist in the index
        #[arg(long)]
        reindex: bool,
    },
    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Test the database connection
    Ping,
    /// Run pending migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config_or_exit();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let result = run(cli, config).await;
    match result {
        Ok(()) => std::process::exit(0),
        Err(error) => {
            let code = error.exit_code();
            tracing::error!(%error, "billsim-cli exiting with error");
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli, config: billsim_core::AppConfig) -> Result<(), CliError> {
    match cli.command {
        Some(Commands::Compare { max }) => {
            let pool = connect_pool(&config).await?;
            let orchestrator = Orchestrator::new(&config, pool)?;
            let summary = orchestrator.compare(max).await?;
            println!(
                "considered {} bills, processed {}, skipped {}, swept {} stale rows",
                summary.bills_considered,
                summary.bills_processed,
                summary.bills_skipped,
                summary.rows_swept
            );
        }
        Some(Commands::Index { reindex }) => {
            let pool = connect_pool(&config).await?;
            let orchestrator = Orchestrator::new(&config, pool)?;
            let summary = orchestrator.index_all(reindex).await?;
            println!(
                "considered {} bills, indexed {}, skipped {}",
                summary.bills_considered, summary.bills_processed, summary.bills_skipped
            );
        }
        Some(Commands::Db { command }) => match command {
            DbCommands::Ping => {
                let pool = connect_pool(&config).await?;
                billsim_db::health_check(&pool).await?;
                println!("database is healthy");
            }
            DbCommands::Migrate => {
                let pool = connect_pool(&config).await?;
                let applied = billsim_db::run_migrations(&pool).await?;
                if applied == 0 {
                    println!("0 pending migrations — database is up to date");
                } else {
                    println!("applied {applied} migration(s) successfully");
                }
            }
        },
        None => println!("billsim-cli: pass --help to see available commands"),
    }

    Ok(())
}

async fn connect_pool(config: &billsim_core::AppConfig) -> Result<sqlx::PgPool, CliError> {
    let pool_config = billsim_db::PoolConfig::from_app_config(config);
    billsim_db::connect_pool(&config.database_url, pool_config)
        .await
        .map_err(billsim_db::DbError::from)
        .map_err(CliError::from)
}

fn load_config_or_exit() -> billsim_core::AppConfig {
    billsim_core::load_app_config_from_env().unwrap_or_else(|error| {
        eprintln!("error: invalid configuration: {error}");
        eprintln!("hint: copy .env.example to .env and fill required values");
        std::process::exit(2);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compare_with_max() {
        let cli = Cli::try_parse_from(["billsim-cli", "compare", "--max", "10"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Compare { max: 10 })
        ));
    }

    #[test]
    fn compare_defaults_to_negative_one_meaning_all_bills() {
        let cli = Cli::try_parse_from(["billsim-cli", "compare"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Compare { max: -1 })));
    }

    #[test]
    fn parses_index_with_reindex_flag() {
        let cli = Cli::try_parse_from(["billsim-cli", "index", "--reindex"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Index { reindex: true })
        ));
    }

    #[test]
    fn index_without_flag_defaults_to_no_reindex() {
        let cli = Cli::try_parse_from(["billsim-cli", "index"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Index { reindex: false })
        ));
    }

    #[test]
    fn parses_db_ping_command() {
        let cli = Cli::try_parse_from(["billsim-cli", "db", "ping"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Db {
                command: DbCommands::Ping
            })
        ));
    }

    #[test]
    fn no_command_is_none() {
        let cli = Cli::try_parse_from(["billsim-cli"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn config_error_maps_to_exit_code_two() {
        let config_error = billsim_core::ConfigError::MissingEnvVar("DATABASE_URL".to_string());
        let cli_error = CliError::from(config_error);
        assert_eq!(cli_error.exit_code(), 2);
    }
}
