pub mod console;
pub mod daemon_path;
pub mod output;
pub mod process;

use std::{io, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use process::{daemon_executable, is_running, kill_previous_servers, restart_server};
use tracing::level_filters::LevelFilter;

use crate::{
    booking::{BookingRequest, BookingSubmitter, Hours, NoListener},
    catalog::{CatalogFetcher, ProjectId, TaskId},
    config::Credentials,
    daemon::args::ReminderArgs,
    moco::client::ReqwestTransport,
    storage::{FileTimestampStore, LastBookingStore, SettingsStore},
    utils::{
        clock::{Clock, DefaultClock},
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX, SERVE_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "mocotray", version, long_about = None)]
#[command(about = "Reminds you to book your hours in MOCO", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts the reminder daemon in the background")]
    Init {
        #[command(flatten)]
        reminder: ReminderArgs,
    },
    #[command(about = "Run the reminder in current console together with a booking prompt")]
    Serve {
        #[command(flatten)]
        reminder: ReminderArgs,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Store MOCO domain and api key")]
    Setup {
        #[arg(long, help = "Company domain, either `acme` or `acme.mocoapp.com`")]
        domain: String,
        #[arg(long = "api-key", help = "Personal api key from your MOCO profile")]
        api_key: String,
    },
    #[command(about = "List projects and tasks you can book on")]
    Projects {},
    #[command(about = "Book time for today")]
    Book {
        #[arg(long, help = "Hours in quarter steps, e.g. 1.5 or 1:30")]
        hours: Hours,
        #[arg(long, help = "Project id, see `mocotray projects`")]
        project: ProjectId,
        #[arg(long, help = "Task id, see `mocotray projects`")]
        task: TaskId,
        #[arg(long, short, default_value = "")]
        description: String,
    },
    #[command(about = "Show when you last booked and whether the daemon is running")]
    Status {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let prefix = match args.commands {
        Commands::Serve { .. } => SERVE_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        Commands::Init { reminder } => {
            restart_server(&std::path::absolute(&dir)?, &reminder)?;
            println!("Reminder daemon started");
            Ok(())
        }
        Commands::Stop {} => {
            let stopped = kill_previous_servers(&daemon_executable()?)?;
            println!("Stopped {stopped} daemon(s)");
            Ok(())
        }
        Commands::Serve { reminder } => console::serve(&dir, reminder.config()).await,
        Commands::Setup { domain, api_key } => {
            let credentials = Credentials::new(domain, api_key);
            credentials.endpoint()?;
            let store = SettingsStore::new(&dir);
            store.save(&credentials).await?;
            println!("Saved settings to {:?}", store.path());
            Ok(())
        }
        Commands::Projects {} => {
            let credentials = SettingsStore::new(&dir).load().await?;
            let fetcher = CatalogFetcher::new(Arc::new(ReqwestTransport::new()?));
            let catalog = fetcher.fetch_catalog(&credentials).await?;
            output::print_catalog(&catalog, &mut io::stdout())?;
            Ok(())
        }
        Commands::Book {
            hours,
            project,
            task,
            description,
        } => {
            let credentials = SettingsStore::new(&dir).load().await?;
            let transport = Arc::new(ReqwestTransport::new()?);
            let catalog = CatalogFetcher::new(transport.clone())
                .fetch_catalog(&credentials)
                .await?;

            let clock = Arc::new(DefaultClock);
            let request = BookingRequest::new(clock.today(), hours, project, task, description);
            // A running daemon notices the new timestamp on its next tick.
            let submitter = BookingSubmitter::new(
                transport,
                Arc::new(FileTimestampStore::new(&dir)?),
                Arc::new(NoListener),
                clock,
            );
            submitter.submit(&request, &catalog, &credentials).await?;
            output::print_booked(&request, &catalog, &mut io::stdout())?;
            Ok(())
        }
        Commands::Status {} => {
            let store = FileTimestampStore::new(&dir)?;
            let last_booking = store.load().await?;
            let threshold = ReminderArgs::default().config().idle_threshold;
            output::print_last_booking(
                last_booking,
                DefaultClock.time(),
                threshold,
                &mut io::stdout(),
            )?;
            let running = is_running(&daemon_executable()?)?;
            println!(
                "Daemon: {}",
                if running { "running" } else { "not running" }
            );
            Ok(())
        }
    }
}
