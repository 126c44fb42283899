use std::fmt::Write;

use admissions_desk::admissions::{
    percent, resolve_attachment_url, Application, ListFilter, Status, StatusSummary,
    SummarySource,
};
use admissions_desk::theme::{Theme, ThemeContext};
use chrono::{DateTime, Utc};
use url::Url;

/// ANSI styling for the active theme. Plain text when colour is off.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    theme: Theme,
    colored: bool,
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Heading,
    Muted,
    Status(Status),
}

impl Palette {
    pub fn new(context: &ThemeContext, colored: bool) -> Self {
        Self {
            theme: context.current(),
            colored,
        }
    }

    fn code(&self, role: Role) -> &'static str {
        match (self.theme, role) {
            (Theme::Light, Role::Heading) => "1;34",
            (Theme::Light, Role::Muted) => "90",
            (Theme::Light, Role::Status(Status::Processing)) => "33",
            (Theme::Light, Role::Status(Status::Accepted)) => "32",
            (Theme::Light, Role::Status(Status::Rejected)) => "31",
            (Theme::Dark, Role::Heading) => "1;96",
            (Theme::Dark, Role::Muted) => "37",
            (Theme::Dark, Role::Status(Status::Processing)) => "93",
            (Theme::Dark, Role::Status(Status::Accepted)) => "92",
            (Theme::Dark, Role::Status(Status::Rejected)) => "91",
        }
    }

    fn paint(&self, text: &str, role: Role) -> String {
        if self.colored {
            format!("\x1b[{}m{}\x1b[0m", self.code(role), text)
        } else {
            text.to_string()
        }
    }

    fn pill(&self, status: Status, width: usize) -> String {
        let text = format!("{:<width$}", format!("[{}]", status.label()));
        self.paint(&text, Role::Status(status))
    }
}

/// Per-status cards. Percentages are shares of the loaded collection, so an
/// empty list shows 0% whatever the counts say.
pub fn summary_cards(
    palette: &Palette,
    summary: StatusSummary,
    source: SummarySource,
    collection_len: usize,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        palette.paint(&format!("Applications ({collection_len} total)"), Role::Heading)
    );
    for status in Status::ALL {
        let count = summary.count(status);
        let _ = writeln!(
            out,
            "  {} {:>4} {:>4}%  {}",
            palette.pill(status, 12),
            count,
            percent(count, collection_len),
            palette.paint(status.hint(), Role::Muted)
        );
    }
    if source == SummarySource::DerivedFromList {
        let _ = writeln!(
            out,
            "  {}",
            palette.paint("(counted from the loaded list)", Role::Muted)
        );
    }
    out
}

pub fn application_table(palette: &Palette, shown: &[&Application], filter: &ListFilter) -> String {
    let mut out = String::new();
    if shown.is_empty() {
        let message = if filter.is_active() {
            "No applications match the current filter."
        } else {
            "No applications yet."
        };
        let _ = writeln!(out, "{}", palette.paint(message, Role::Muted));
    } else {
        let header = format!(
            "{:>5}  {:<24} {:<9} {:<7} {:<13} {}",
            "ID", "Applicant", "Grade", "Gender", "Status", "Activities"
        );
        let _ = writeln!(out, "{}", palette.paint(&header, Role::Heading));
        for application in shown {
            let _ = writeln!(
                out,
                "{:>5}  {:<24} {:<9} {:<7} {} {}",
                application.id,
                application.applicant_name,
                application.grade_level,
                application.gender.label(),
                palette.pill(application.status, 13),
                activities_text(application)
            );
        }
    }

    let mut footer = format!("{} shown", shown.len());
    if filter.is_active() {
        let mut criteria = Vec::new();
        if !filter.query().trim().is_empty() {
            criteria.push(format!("name contains \"{}\"", filter.query().trim()));
        }
        if let Some(status) = filter.status() {
            criteria.push(format!("status {}", status.label()));
        }
        footer.push_str(&format!(" ({})", criteria.join(", ")));
    }
    let _ = writeln!(out, "{}", palette.paint(&footer, Role::Muted));
    out
}

pub fn application_detail(palette: &Palette, application: &Application, api_base: &Url) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        palette.paint(&format!("Application #{}", application.id), Role::Heading),
        palette.pill(application.status, 0)
    );

    let missing = palette.paint("Not provided", Role::Muted);
    let rows = [
        ("Applicant", application.applicant_name.clone()),
        ("Grade", application.grade_level.clone()),
        ("Gender", application.gender.label().to_string()),
        ("Activities", activities_text(application)),
        (
            "Photo",
            resolve_attachment_url(api_base, application.image.as_deref())
                .unwrap_or_else(|| missing.clone()),
        ),
        (
            "Document",
            resolve_attachment_url(api_base, application.document.as_deref())
                .unwrap_or_else(|| missing.clone()),
        ),
        ("Created", timestamp(application.created_at)),
        ("Updated", timestamp(application.updated_at)),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<11} {value}");
    }
    out
}

fn activities_text(application: &Application) -> String {
    if application.activities.is_empty() {
        "None".to_string()
    } else {
        application.activities.join(", ")
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}
