use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod logging;
mod notifier;
mod player;

use notifier::Output;

#[derive(Parser)]
#[command(name = "kamatis", version, about = "Pomodoro Technique timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer, reading commands from stdin
    Run {
        /// Begin a work period immediately
        #[arg(long)]
        start: bool,
        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
        /// Do not show desktop notifications
        #[arg(long)]
        no_notify: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Sound selection
    Sound {
        #[command(subcommand)]
        action: commands::sound::SoundAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    logging::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            start,
            json,
            no_notify,
        } => commands::run::run(commands::run::RunOptions {
            start,
            output: if json { Output::Json } else { Output::Text },
            desktop: !no_notify,
        }),
        Commands::Config { action } => commands::config::run(action),
        Commands::Sound { action } => commands::sound::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "kamatis", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::debug!("Command failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
