use clap::{Parser, Subcommand, ValueEnum};

use accounts::{app, config::AppConfig, state::AppState};

#[derive(Parser)]
#[command(name = "accounts", about = "User accounts service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations and serve HTTP (default).
    Serve,
    /// Move the schema without serving.
    Migrate {
        #[arg(value_enum)]
        direction: Direction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "accounts=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let state = AppState::init(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            state.users.migrate_up().await?;
            app::serve(app::build_app(state), &config.host, config.port).await
        }
        Command::Migrate { direction: Direction::Up } => {
            state.users.migrate_up().await?;
            tracing::info!("migrations applied");
            Ok(())
        }
        Command::Migrate { direction: Direction::Down } => {
            state.users.migrate_down().await?;
            tracing::info!("last migration reverted");
            Ok(())
        }
    }
}
