//! Interactive booking console used by `mocotray serve`. Reads one command per line while the
//! reminder keeps running next to it.

use std::{
    io::{self, Write},
    ops::ControlFlow,
    path::Path,
    str::FromStr,
    sync::Arc,
};

use ansi_term::Colour;
use anyhow::{anyhow, bail, Context, Result};
use futures::{Stream, StreamExt};
use tokio::{io::AsyncBufReadExt, sync::watch};
use tokio_stream::wrappers::LinesStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    booking::{BookingForm, BookingListener, BookingSubmitter, Hours},
    catalog::{Catalog, CatalogFetcher, ProjectId, TaskId},
    daemon::{create_scheduler, run_until_shutdown},
    moco::{client::ReqwestTransport, MocoTransport},
    reminder::{self, ReminderConfig, ReminderMode, ReminderState, TerminalIndicator},
    storage::{FileTimestampStore, SettingsStore},
    utils::{clock::{Clock, DefaultClock}, transient::TransientMessage},
};

use super::output;

const HELP: &str = "\
projects                 reload projects and tasks
select <project> [task]  pick a project (and task) by id
task <task>              pick a task of the selected project
+ / -                    add or remove a quarter hour
hours <h>                set hours directly, e.g. 1.5 or 1:30
describe <text>          set the description
book                     book the entry
status                   show reminder and form state
quit                     stop serving";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Projects,
    Select {
        project: ProjectId,
        task: Option<TaskId>,
    },
    Task(TaskId),
    Increment,
    Decrement,
    Hours(Hours),
    Describe(String),
    Book,
    Status,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let rest = rest.trim();
        let mut words = rest.split_whitespace();

        let command = match name {
            "projects" | "reload" => Self::Projects,
            "select" => {
                let project = words
                    .next()
                    .ok_or_else(|| anyhow!("Usage: select <project> [task]"))?
                    .parse::<ProjectId>()
                    .context("Project id must be a number")?;
                let task = words
                    .next()
                    .map(|v| v.parse::<TaskId>().context("Task id must be a number"))
                    .transpose()?;
                Self::Select { project, task }
            }
            "task" => Self::Task(
                words
                    .next()
                    .ok_or_else(|| anyhow!("Usage: task <task>"))?
                    .parse::<TaskId>()
                    .context("Task id must be a number")?,
            ),
            "+" => Self::Increment,
            "-" => Self::Decrement,
            "hours" => Self::Hours(rest.parse()?),
            "describe" => Self::Describe(rest.to_string()),
            "book" => Self::Book,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("Unknown command {other:?}, try help"),
        };
        Ok(command)
    }
}

pub struct Console<T> {
    fetcher: CatalogFetcher<T>,
    submitter: BookingSubmitter<T>,
    settings: SettingsStore,
    clock: Arc<dyn Clock>,
    reminder: watch::Receiver<ReminderState>,
    catalog: Catalog,
    form: BookingForm,
    message: TransientMessage,
}

impl<T: MocoTransport> Console<T> {
    pub fn new(
        fetcher: CatalogFetcher<T>,
        submitter: BookingSubmitter<T>,
        settings: SettingsStore,
        clock: Arc<dyn Clock>,
        reminder: watch::Receiver<ReminderState>,
    ) -> Self {
        Self {
            fetcher,
            submitter,
            settings,
            clock,
            reminder,
            catalog: Catalog::default(),
            form: BookingForm::default(),
            message: TransientMessage::default(),
        }
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn message(&self) -> Option<&str> {
        self.message.current(self.clock.instant())
    }

    pub fn prompt(&self) -> String {
        let glyph = match self.reminder.borrow().mode {
            ReminderMode::Idle => Colour::Green.paint("●"),
            ReminderMode::Blinking => Colour::Yellow.bold().paint("●"),
        };
        match self.message() {
            Some(message) => format!(
                "{glyph} {} {} > ",
                self.form.display_time(),
                Colour::Red.paint(message)
            ),
            None => format!("{glyph} {} > ", self.form.display_time()),
        }
    }

    fn fail(&mut self, message: String, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", Colour::Red.paint(message.as_str()))?;
        self.message.show(message, self.clock.instant());
        Ok(())
    }

    /// Reopening the catalog drops whatever message was showing, like closing the popover did.
    async fn reload(&mut self, out: &mut impl Write) -> Result<()> {
        self.message.dismiss();
        let credentials = self.settings.load().await?;
        match self.fetcher.fetch_catalog(&credentials).await {
            Ok(catalog) => {
                self.catalog = catalog;
                self.form.restore_selection(&self.catalog);
                output::print_catalog(&self.catalog, out)?;
            }
            Err(e) => self.fail(e.to_string(), out)?,
        }
        Ok(())
    }

    pub async fn handle(
        &mut self,
        command: ConsoleCommand,
        out: &mut impl Write,
    ) -> Result<ControlFlow<()>> {
        debug!("Console command {command:?}");
        match command {
            ConsoleCommand::Projects => self.reload(out).await?,
            ConsoleCommand::Select { project, task } => {
                if self.catalog.project(project).is_none() {
                    self.fail(format!("Unknown project {project}"), out)?;
                    return Ok(ControlFlow::Continue(()));
                }
                self.form.select_project(project);
                match task {
                    Some(task) => self.form.select_task(task),
                    None => {
                        for task in self.form.tasks(&self.catalog) {
                            writeln!(out, "    {} #{}", task.name, task.id)?;
                        }
                    }
                }
            }
            ConsoleCommand::Task(task) => self.form.select_task(task),
            ConsoleCommand::Increment => self.form.increment(),
            ConsoleCommand::Decrement => self.form.decrement(),
            ConsoleCommand::Hours(hours) => self.form.hours = hours,
            ConsoleCommand::Describe(description) => self.form.description = description,
            ConsoleCommand::Book => {
                let credentials = self.settings.load().await?;
                let request = self.form.to_request(self.clock.today());
                match self
                    .submitter
                    .submit_form(&mut self.form, &self.catalog, &credentials)
                    .await
                {
                    Ok(_) => {
                        if let Some(request) = request {
                            output::print_booked(&request, &self.catalog, out)?;
                        }
                    }
                    Err(e) => self.fail(e.to_string(), out)?,
                }
            }
            ConsoleCommand::Status => {
                let state = *self.reminder.borrow();
                writeln!(out, "Reminder: {}", output::reminder_label(&state))?;
                let project = self
                    .form
                    .selected_project
                    .and_then(|id| self.catalog.project(id));
                let task = self
                    .form
                    .selected_project
                    .zip(self.form.selected_task)
                    .and_then(|(p, t)| self.catalog.task(p, t));
                writeln!(
                    out,
                    "Project: {}\nTask: {}\nHours: {}\nDescription: {}",
                    project.map(|p| p.name.as_str()).unwrap_or("-"),
                    task.map(|t| t.name.as_str()).unwrap_or("-"),
                    output::hours_label(self.form.hours),
                    self.form.description,
                )?;
            }
            ConsoleCommand::Help => writeln!(out, "{HELP}")?,
            ConsoleCommand::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Executes the console loop until input ends, `quit`, or shutdown.
    pub async fn run(
        mut self,
        mut lines: impl Stream<Item = io::Result<String>> + Unpin,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let mut out = io::stdout();
        self.reload(&mut out).await?;

        loop {
            write!(out, "{}", self.prompt())?;
            out.flush()?;

            let line = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                line = lines.next() => line,
            };
            let Some(line) = line.transpose()? else {
                return Ok(());
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<ConsoleCommand>() {
                Ok(v) => v,
                Err(e) => {
                    self.fail(e.to_string(), &mut out)?;
                    continue;
                }
            };
            if self.handle(command, &mut out).await?.is_break() {
                return Ok(());
            }
        }
    }
}

/// Foreground mode: the reminder blinks the terminal title while the console takes bookings.
pub async fn serve(dir: &Path, config: ReminderConfig) -> Result<()> {
    let shutdown_token = CancellationToken::new();
    let (handle, events) = reminder::channel();
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let scheduler = create_scheduler(
        dir,
        Arc::new(TerminalIndicator),
        &shutdown_token,
        config,
        DefaultClock,
    )?;

    let transport = Arc::new(ReqwestTransport::new()?);
    let listener: Arc<dyn BookingListener> = Arc::new(handle);
    let console = Console::new(
        CatalogFetcher::new(transport.clone()),
        BookingSubmitter::new(
            transport,
            Arc::new(FileTimestampStore::new(dir)?),
            listener,
            clock.clone(),
        ),
        SettingsStore::new(dir),
        clock,
        scheduler.subscribe(),
    );

    let lines = LinesStream::new(tokio::io::BufReader::new(tokio::io::stdin()).lines());
    info!("Serving from {dir:?}");

    let (reminder_result, console_result) = tokio::join!(
        run_until_shutdown(scheduler, events, shutdown_token.clone()),
        async {
            let result = console.run(lines, shutdown_token.clone()).await;
            shutdown_token.cancel();
            result
        },
    );

    if let Err(e) = &console_result {
        error!("Console stopped with an error {e:?}");
    }
    reminder_result?;
    console_result
}
