use std::fmt;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::error;

use crate::api::advert::dto::{AdvertRow, SortKey};
use crate::api::advert::{AdvertForm, AdvertService, ServiceError};
use crate::db::models::{Category, MAX_NOTE};
use crate::sites::JOB_BOARDS;

/// Record and browse job advertisement leads
#[derive(Parser, Debug)]
#[command(name = "job-advert-logger", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new job advert
    Add(AddArgs),
    /// Edit a stored job advert (its URL and date never change)
    Edit(EditArgs),
    /// Show the fields of a stored job advert
    Show {
        /// URL of the advert
        url: String,
    },
    /// List stored job adverts
    List {
        /// Column to sort on
        #[arg(long, value_enum, default_value_t = SortKey::Url)]
        sort: SortKey,
        /// Sort in descending order
        #[arg(long)]
        reverse: bool,
    },
    /// List job boards worth searching
    Sites,
    /// Show the selectable categories and notes
    Choices,
}

#[derive(Args, Debug, Default)]
pub struct AddArgs {
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long, default_value = "")]
    pub organization: String,
    #[arg(long, default_value = "")]
    pub url: String,
    #[arg(long, default_value = "")]
    pub title: String,
    /// Rating between 0 and 5
    #[arg(long)]
    pub note: Option<String>,
    #[arg(long, default_value = "")]
    pub pros: String,
    #[arg(long, default_value = "")]
    pub cons: String,
    #[arg(long, default_value = "")]
    pub desc: String,
}

impl From<AddArgs> for AdvertForm {
    fn from(args: AddArgs) -> Self {
        AdvertForm {
            category: args.category,
            organization: args.organization,
            url: args.url,
            title: args.title,
            note: args.note,
            pros: args.pros,
            cons: args.cons,
            desc: args.desc,
        }
    }
}

/// Fields left out keep their stored value
#[derive(Args, Debug, Default)]
pub struct EditArgs {
    /// URL of the advert to edit
    pub url: String,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub organization: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    /// Rating between 0 and 5
    #[arg(long)]
    pub note: Option<String>,
    #[arg(long)]
    pub pros: Option<String>,
    #[arg(long)]
    pub cons: Option<String>,
    #[arg(long)]
    pub desc: Option<String>,
}

impl EditArgs {
    /// Overlay the given flags on a pre-filled form
    fn apply_to(self, form: &mut AdvertForm) {
        if self.category.is_some() {
            form.category = self.category;
        }
        if self.note.is_some() {
            form.note = self.note;
        }
        if let Some(organization) = self.organization {
            form.organization = organization;
        }
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(pros) = self.pros {
            form.pros = pros;
        }
        if let Some(cons) = self.cons {
            form.cons = cons;
        }
        if let Some(desc) = self.desc {
            form.desc = desc;
        }
    }
}

/// Errors reported by a command
#[derive(Debug)]
pub enum CliError {
    Service(ServiceError),
    Output(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Service(e) => write!(f, "{}", e),
            CliError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ServiceError> for CliError {
    fn from(err: ServiceError) -> Self {
        CliError::Service(err)
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Output(err)
    }
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_status(&self) -> u8 {
        match self {
            CliError::Service(ServiceError::Validation(_)) => 2,
            CliError::Service(ServiceError::NotFound(_)) => 3,
            CliError::Service(ServiceError::Store(_)) | CliError::Output(_) => 1,
        }
    }
}

/// Run one command against the service, writing results to `out`
pub fn execute<W: Write>(command: Command, service: &mut AdvertService, out: &mut W) -> Result<(), CliError> {
    match command {
        Command::Add(args) => {
            let record = service.add(&AdvertForm::from(args))?;
            writeln!(out, "Added {} ({})", record.url, record.date)?;
        }
        Command::Edit(args) => {
            let url = args.url.clone();
            let mut form = service
                .form_for(&url)
                .ok_or_else(|| ServiceError::NotFound(url.clone()))?;
            args.apply_to(&mut form);
            service.edit(&url, &form)?;
            writeln!(out, "Updated {}", url)?;
        }
        Command::Show { url } => {
            let form = service.form_for(&url).ok_or(ServiceError::NotFound(url))?;
            write_form(out, &form)?;
        }
        Command::List { sort, reverse } => {
            write_rows(out, &service.list(sort, reverse))?;
        }
        Command::Sites => {
            for board in JOB_BOARDS.iter() {
                writeln!(out, "{}: {}", board.name, board.url)?;
            }
        }
        Command::Choices => {
            let categories: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
            let notes: Vec<String> = (0..=MAX_NOTE).map(|n| n.to_string()).collect();
            writeln!(out, "Categories: {}", categories.join(", "))?;
            writeln!(out, "Notes: {}", notes.join(", "))?;
        }
    }
    Ok(())
}

/// Report a failed command to the user and pick the exit status
pub fn report(err: &CliError) -> ExitCode {
    match err {
        CliError::Service(ServiceError::Validation(_)) => eprintln!("Error\n{}", err),
        _ => {
            error!("{}", err);
            eprintln!("{}", err);
        }
    }
    ExitCode::from(err.exit_status())
}

fn write_form<W: Write>(out: &mut W, form: &AdvertForm) -> io::Result<()> {
    writeln!(out, "Category:     {}", form.category.as_deref().unwrap_or(""))?;
    writeln!(out, "Organization: {}", form.organization)?;
    writeln!(out, "Url:          {}", form.url)?;
    writeln!(out, "Title:        {}", form.title)?;
    writeln!(out, "Note:         {}", form.note.as_deref().unwrap_or(""))?;
    writeln!(out, "Pros:\n{}", form.pros)?;
    writeln!(out, "Cons:\n{}", form.cons)?;
    writeln!(out, "Description:\n{}", form.desc)
}

fn write_rows<W: Write>(out: &mut W, rows: &[AdvertRow]) -> io::Result<()> {
    let category_width = Category::ALL.iter().map(|c| c.label().len()).max().unwrap_or(8);
    let organization_width = rows
        .iter()
        .map(|r| r.organization.chars().count())
        .chain(std::iter::once("Organization".len()))
        .max()
        .unwrap_or(12);

    writeln!(
        out,
        "{:<cw$}  {:<ow$}  Note  Date        Url  Title",
        "Category",
        "Organization",
        cw = category_width,
        ow = organization_width,
    )?;
    for row in rows {
        writeln!(
            out,
            "{:<cw$}  {:<ow$}  {:<4}  {}  {}  {}",
            row.category.label(),
            row.organization,
            row.note,
            row.date,
            row.url,
            row.title,
            cw = category_width,
            ow = organization_width,
        )?;
    }
    Ok(())
}
