// This runs daemon on windows without creating a console. Disable during development to see
// stdout.
#![windows_subsystem = "windows"]

use std::env::args;

use anyhow::Result;
use clap::Parser;
use mocotray::{
    daemon::{args::DaemonArgs, start_daemon},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, DAEMON_PREFIX},
        runtime::single_thread_runtime,
    },
};

fn main() -> Result<()> {
    run_service(args().collect::<Vec<_>>())
}

fn run_service(command_args: Vec<String>) -> Result<()> {
    let args = DaemonArgs::parse_from(&command_args);

    if !args.force {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;

            const DETACHED_PROCESS: u32 = 0x00000008;

            let mut command_args = command_args;
            command_args.push("--force".into());
            let process_name = std::env::current_exe()?;
            let mut command = std::process::Command::new(process_name);
            command.args(command_args.into_iter().skip(1));
            command.creation_flags(DETACHED_PROCESS);
            command.stdin(std::process::Stdio::null());
            command.stdout(std::process::Stdio::null());
            command.stderr(std::process::Stdio::null());
            #[allow(clippy::zombie_processes)]
            command.spawn()?;
            return Ok(());
        }
        #[cfg(unix)]
        {
            match detached().execute() {
                daemonize::Outcome::Parent(parent) => {
                    parent.map_err(|e| anyhow::anyhow!("Failed to create daemon {e}"))?;
                    println!("Created daemon");
                    return Ok(());
                }
                daemonize::Outcome::Child(child) => {
                    child.map_err(|e| anyhow::anyhow!("Failed to set up daemon {e}"))?;
                }
            }
        }
    }

    run(args)
}

/// Daemonize already points stdin at /dev/null.
#[cfg(unix)]
fn detached() -> daemonize::Daemonize<()> {
    daemonize::Daemonize::new()
        .working_directory("/")
        .stdout(daemonize::Stdio::devnull())
        .stderr(daemonize::Stdio::devnull())
}

fn run(args: DaemonArgs) -> Result<()> {
    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    enable_logging(DAEMON_PREFIX, &app_dir.join("logs"), args.log, args.log_console)?;
    let config = args.reminder.config();
    single_thread_runtime()?.block_on(async move { start_daemon(&app_dir, config).await })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use mocotray::daemon::args::DaemonArgs;

    #[test]
    #[cfg(unix)]
    fn test_detached_settings_build() {
        // Only configures the fork, nothing is executed here.
        let _ = super::detached();
    }

    #[test]
    fn test_forced_launch_runs_in_place() {
        let args = DaemonArgs::parse_from(["mocotray-daemon", "--force", "--dir", "/tmp/moco"]);
        assert!(args.force);
        assert_eq!(args.dir.as_deref(), Some(std::path::Path::new("/tmp/moco")));
    }
}
