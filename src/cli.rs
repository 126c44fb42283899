use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use admissions_desk::admissions::export::write_csv;
use admissions_desk::admissions::{
    Activity, ApplicationCreateForm, ApplicationEditForm, ApplicationId, ApplicationListStore,
    AttachmentKind, Gender, GradeLevel, ListFilter, PreviewRegistry, Status,
};
use admissions_desk::api::HttpApplicationsApi;
use admissions_desk::config::AppConfig;
use admissions_desk::error::AppError;
use admissions_desk::telemetry;
use admissions_desk::theme::{Theme, ThemeContext};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use crate::render::{self, Palette};

#[derive(Parser, Debug)]
#[command(
    name = "admissions-desk",
    about = "Review and manage school admission applications from the command line",
    version
)]
pub struct Cli {
    /// Override the configured API origin
    #[arg(long, global = true)]
    api_base: Option<String>,
    /// Admin key sent as X-ADMIN-KEY on every request
    #[arg(long, global = true)]
    admin_key: Option<String>,
    /// Colour scheme for terminal output
    #[arg(long, global = true, value_parser = parse_theme)]
    theme: Option<Theme>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show summary cards followed by the (filtered) application list
    List(ListArgs),
    /// Show the per-status summary cards only
    Summary,
    /// Show one application with resolved attachment links
    Show {
        /// Application id
        id: String,
    },
    /// Submit a new application
    Create(CreateArgs),
    /// Replace the editable fields of an application
    Edit(EditArgs),
    /// Move an application to another status
    Status {
        /// Application id
        id: String,
        /// Target status (PROCESSING, ACCEPTED, REJECTED or a known synonym)
        status: Status,
    },
    /// Delete an application
    Delete {
        /// Application id
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    /// Case-insensitive substring of the applicant name
    #[arg(long)]
    query: Option<String>,
    /// Only show applications in this status
    #[arg(long)]
    status: Option<Status>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Csv,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Applicant name
    #[arg(long)]
    name: String,
    /// Grade level, e.g. "10" or "Grade 10" (defaults to Grade 10)
    #[arg(long)]
    grade: Option<GradeLevel>,
    #[arg(long)]
    gender: Option<Gender>,
    #[arg(long)]
    status: Option<Status>,
    /// Extracurricular activity; repeat for several
    #[arg(long = "activity")]
    activities: Vec<Activity>,
    /// Photo (.jpg, .jpeg or .png)
    #[arg(long)]
    image: Option<PathBuf>,
    /// Supporting document (.pdf, .doc or .docx)
    #[arg(long)]
    document: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Application id
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    grade: Option<GradeLevel>,
    #[arg(long)]
    gender: Option<Gender>,
    #[arg(long)]
    status: Option<Status>,
    /// Select the activity if absent, deselect it if present; repeatable
    #[arg(long = "toggle-activity")]
    toggle_activities: Vec<Activity>,
    /// Replacement photo; the stored one is kept when omitted
    #[arg(long)]
    image: Option<PathBuf>,
    /// Replacement document; the stored one is kept when omitted
    #[arg(long)]
    document: Option<PathBuf>,
}

fn parse_theme(raw: &str) -> Result<Theme, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "light" | "dark" => Ok(Theme::from_str(raw)),
        _ => Err(format!("unknown theme '{raw}' (expected light or dark)")),
    }
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let Cli {
        api_base,
        admin_key,
        theme,
        command,
    } = cli;

    let mut config = AppConfig::load()?;
    if let Some(raw) = api_base {
        config.api.set_base_url(&raw)?;
    }
    if let Some(key) = admin_key {
        let key = key.trim().to_string();
        config.api.admin_key = (!key.is_empty()).then_some(key);
    }
    if let Some(theme) = theme {
        config.theme = theme;
    }

    telemetry::init(&config.telemetry)?;
    debug!(
        environment = ?config.environment,
        api = %config.api.base_url,
        admin = config.api.admin_key.is_some(),
        "admissions desk configured"
    );

    let desk = Desk {
        api: Arc::new(HttpApplicationsApi::new(&config.api)?),
        palette: Palette::new(&ThemeContext::new(config.theme), io::stdout().is_terminal()),
        previews: PreviewRegistry::new(),
    };

    match command {
        Command::List(args) => desk.list(args).await,
        Command::Summary => desk.summary().await,
        Command::Show { id } => desk.show(&id).await,
        Command::Create(args) => desk.create(args).await,
        Command::Edit(args) => desk.edit(args).await,
        Command::Status { id, status } => desk.change_status(&id, status).await,
        Command::Delete { id, yes } => desk.delete(&id, yes).await,
    }
}

struct Desk {
    api: Arc<HttpApplicationsApi>,
    palette: Palette,
    previews: PreviewRegistry,
}

impl Desk {
    async fn loaded_store(&self) -> Result<ApplicationListStore<HttpApplicationsApi>, AppError> {
        let mut store = ApplicationListStore::new(Arc::clone(&self.api));
        store.refresh().await?;
        Ok(store)
    }

    async fn list(&self, args: ListArgs) -> Result<(), AppError> {
        let store = self.loaded_store().await?;
        let filter = ListFilter::new()
            .with_query(args.query.unwrap_or_default())
            .with_status(args.status);
        let shown = store.filtered(&filter);

        match args.format {
            OutputFormat::Csv => {
                let stdout = io::stdout();
                write_csv(stdout.lock(), shown, self.api.base_url())?;
            }
            OutputFormat::Table => {
                print!(
                    "{}",
                    render::summary_cards(
                        &self.palette,
                        store.summary(),
                        store.summary_source(),
                        store.items().len(),
                    )
                );
                println!();
                print!("{}", render::application_table(&self.palette, &shown, &filter));
            }
        }
        Ok(())
    }

    async fn summary(&self) -> Result<(), AppError> {
        let store = self.loaded_store().await?;
        print!(
            "{}",
            render::summary_cards(
                &self.palette,
                store.summary(),
                store.summary_source(),
                store.items().len(),
            )
        );
        Ok(())
    }

    async fn show(&self, raw_id: &str) -> Result<(), AppError> {
        let mut form = ApplicationEditForm::open(Arc::clone(&self.api), raw_id, self.previews.clone())?;
        form.load().await?;
        self.print_detail(&form);
        Ok(())
    }

    async fn create(&self, args: CreateArgs) -> Result<(), AppError> {
        let mut form = ApplicationCreateForm::new(Arc::clone(&self.api), self.previews.clone());
        {
            let draft = form.draft_mut();
            draft.applicant_name = args.name;
            if let Some(grade) = args.grade {
                draft.set_grade_level(grade);
            }
            if let Some(gender) = args.gender {
                draft.gender = gender;
            }
            if let Some(status) = args.status {
                draft.status = status;
            }
            for activity in args.activities {
                if !draft.activities.contains(activity.label()) {
                    draft.toggle_activity(activity.label());
                }
            }
        }
        if let Some(path) = args.image {
            form.select_attachment(AttachmentKind::Image, path)?;
        }
        if let Some(path) = args.document {
            form.select_attachment(AttachmentKind::Document, path)?;
        }

        let id = form.submit().await?;
        println!("Created application #{id}.");

        // Show the stored copy rather than what was sent.
        let mut view = ApplicationEditForm::for_id(Arc::clone(&self.api), id, self.previews.clone());
        view.load().await?;
        self.print_detail(&view);
        Ok(())
    }

    async fn edit(&self, args: EditArgs) -> Result<(), AppError> {
        let mut form = ApplicationEditForm::open(Arc::clone(&self.api), &args.id, self.previews.clone())?;
        form.load().await?;

        {
            let draft = form.draft_mut();
            if let Some(name) = args.name {
                draft.applicant_name = name;
            }
            if let Some(grade) = args.grade {
                draft.set_grade_level(grade);
            }
            if let Some(gender) = args.gender {
                draft.gender = gender;
            }
            if let Some(status) = args.status {
                draft.status = status;
            }
            for activity in args.toggle_activities {
                draft.toggle_activity(activity.label());
            }
        }
        if let Some(path) = args.image {
            form.select_attachment(AttachmentKind::Image, path)?;
        }
        if let Some(path) = args.document {
            form.select_attachment(AttachmentKind::Document, path)?;
        }

        form.save().await?;
        println!("Saved application #{}.", form.id());
        self.print_detail(&form);
        Ok(())
    }

    async fn change_status(&self, raw_id: &str, status: Status) -> Result<(), AppError> {
        let mut form = ApplicationEditForm::open(Arc::clone(&self.api), raw_id, self.previews.clone())?;
        form.change_status(status).await?;
        println!("Application #{} is now {}.", form.id(), status.label());
        self.print_detail(&form);
        Ok(())
    }

    async fn delete(&self, raw_id: &str, assume_yes: bool) -> Result<(), AppError> {
        let id = ApplicationId::parse(raw_id)?;
        if !assume_yes && !confirm("Delete this application?")? {
            println!("Cancelled.");
            return Ok(());
        }

        let mut store = ApplicationListStore::new(Arc::clone(&self.api));
        store.delete(id).await?;
        info!(%id, remaining = store.items().len(), "delete confirmed");
        println!(
            "Deleted application #{id}. {} remaining.",
            store.items().len()
        );
        Ok(())
    }

    fn print_detail(&self, form: &ApplicationEditForm<HttpApplicationsApi>) {
        if let Some(application) = form.snapshot() {
            print!(
                "{}",
                render::application_detail(&self.palette, application, self.api.base_url())
            );
        }
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt} [y/N] ")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
