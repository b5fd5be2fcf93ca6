use std::io::{self, Write};

use ansi_term::{Colour, Style};
use chrono::{DateTime, Local, Utc};

use crate::{
    booking::{BookingRequest, Hours},
    catalog::Catalog,
    reminder::{ReminderMode, ReminderState},
    utils::time::format_idle,
};

pub fn print_catalog(catalog: &Catalog, out: &mut impl Write) -> io::Result<()> {
    if catalog.is_empty() {
        return writeln!(out, "No bookable projects");
    }

    for project in catalog.projects() {
        writeln!(
            out,
            "{} {}",
            Style::new().bold().paint(project.name.as_str()),
            Colour::Fixed(8).paint(format!("#{}", project.id)),
        )?;
        for task in &project.tasks {
            writeln!(
                out,
                "    {} {}",
                task.name,
                Colour::Fixed(8).paint(format!("#{}", task.id)),
            )?;
        }
    }
    Ok(())
}

pub fn print_booked(request: &BookingRequest, catalog: &Catalog, out: &mut impl Write) -> io::Result<()> {
    let project = catalog
        .project(request.project_id)
        .map(|p| p.name.as_str())
        .unwrap_or("?");
    let task = catalog
        .task(request.project_id, request.task_id)
        .map(|t| t.name.as_str())
        .unwrap_or("?");

    writeln!(
        out,
        "{} {} on {project} / {task}",
        Colour::Green.paint("Booked"),
        hours_label(request.hours),
    )
}

pub fn hours_label(hours: Hours) -> String {
    Style::new().bold().paint(hours.display_time()).to_string()
}

pub fn print_last_booking(
    last_booking: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: chrono::Duration,
    out: &mut impl Write,
) -> io::Result<()> {
    match last_booking {
        Some(last) => {
            let idle = (now - last).max(chrono::Duration::zero());
            let label = format!("{} ago", format_idle(idle));
            let label = if idle >= threshold {
                Colour::Yellow.paint(label)
            } else {
                Colour::Green.paint(label)
            };
            writeln!(
                out,
                "Last booking: {} ({label})",
                last.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )
        }
        None => writeln!(out, "Last booking: {}", Colour::Yellow.paint("never")),
    }
}

pub fn reminder_label(state: &ReminderState) -> String {
    match state.mode {
        ReminderMode::Idle => Colour::Green.paint("idle").to_string(),
        ReminderMode::Blinking => Colour::Yellow.bold().paint("time to book").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::catalog::{Catalog, Project, ProjectId, Task, TaskId};

    use super::{print_catalog, print_last_booking};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut out = vec![];
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_catalog_output() {
        let catalog = Catalog::from_projects(vec![Project {
            id: ProjectId::new(10),
            name: "Website".into(),
            tasks: vec![Task {
                id: TaskId::new(100),
                name: "Design".into(),
            }],
        }]);

        let text = render(|out| print_catalog(&catalog, out));
        assert!(text.contains("Website"));
        assert!(text.contains("#10"));
        assert!(text.contains("Design"));
        assert!(text.contains("#100"));

        let empty = render(|out| print_catalog(&Catalog::default(), out));
        assert_eq!(empty, "No bookable projects\n");
    }

    #[test]
    fn test_last_booking_output() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 14, 0, 0).unwrap();

        let never = render(|out| print_last_booking(None, now, Duration::minutes(120), out));
        assert!(never.contains("never"));

        let recent = render(|out| {
            print_last_booking(
                Some(now - Duration::minutes(65)),
                now,
                Duration::minutes(120),
                out,
            )
        });
        assert!(recent.contains("1h 05m ago"));
    }
}
