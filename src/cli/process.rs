use std::{
    env,
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Pid, Process, Signal, System};
use tracing::{debug, info};

use crate::daemon::args::ReminderArgs;

use super::daemon_path::to_daemon_path;

pub fn daemon_executable() -> Result<PathBuf> {
    Ok(to_daemon_path(env::current_exe()?))
}

fn matching_processes<'a>(
    system: &'a System,
    name: &'a Path,
    current_id: Pid,
) -> impl Iterator<Item = &'a Process> + 'a {
    system.processes().iter().filter_map(move |(pid, process)| {
        if *pid == current_id {
            return None;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            return None;
        }
        process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .map(|_| process)
    })
}

pub fn is_running(name: &Path) -> Result<bool> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't determine own pid: {e}"))?;
    let running = matching_processes(&system, name, current_id).next().is_some();
    Ok(running)
}

/// Terminates every other process started from `name`. Returns how many were stopped.
pub fn kill_previous_servers(name: &Path) -> Result<usize> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't determine own pid: {e}"))?;

    let mut stopped = 0;
    for process in matching_processes(&system, name, current_id) {
        debug!("Stopping {:?} ({})", process.exe(), process.pid());
        // This will forcefully terminate the process on Windows. Anything better will require a
        // lot more work.
        if process.kill_with(Signal::Term).is_none() {
            process.kill();
        }
        process.wait();
        stopped += 1;
    }
    Ok(stopped)
}

/// Shuts down a previous daemon and starts a new one. The daemon binary detaches itself, so this
/// only has to wait for the launcher to exit.
pub fn restart_server(dir: &Path, reminder: &ReminderArgs) -> Result<()> {
    let daemon = daemon_executable()?;
    let stopped = kill_previous_servers(&daemon)?;
    if stopped > 0 {
        info!("Stopped {stopped} running daemon(s)");
    }

    let mut command = std::process::Command::new(&daemon);
    command.arg("--dir").arg(dir);
    command.args(reminder.to_args());
    command.stdin(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
        command.stdout(Stdio::null());
    }

    debug!("Spawning {daemon:?}");
    let status = command
        .status()
        .map_err(|e| anyhow!("Failed to start {daemon:?}: {e}"))?;
    if !status.success() {
        return Err(anyhow!("Daemon launcher exited with {status}"));
    }
    Ok(())
}
