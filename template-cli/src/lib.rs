//! # Template Builder CLI
//!
//! Command-line front end over a file-backed template repository.
//!
//! ## Usage
//!
//! ```bash
//! template-builder --data-dir ./templates new "Invoice" --type pdf --tag finance
//! template-builder list --type pdf --search invoice
//! template-builder export <id> --output invoice.xml
//! template-builder import <id> invoice.xml
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `open_store` - Opens the data directory as a `MemoryTemplateStore`
//! - `run` - Executes one `Command` against any `TemplateRepository`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use template_core::{
    export_xml, DragPayload, EditorSession, MemoryTemplateStore, StoreError, Template,
    TemplateFilter, TemplateRepository, TemplateType,
};

/// Command-line arguments for template-builder.
#[derive(Debug, Clone, Parser)]
#[command(name = "template-builder")]
#[command(about = "Manage document templates: list, create, import and export")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding saved templates, one JSON file each
    #[arg(long, env = "TEMPLATE_DATA_DIR", default_value = "templates")]
    pub data_dir: PathBuf,

    /// Simulated backend latency in milliseconds
    #[arg(long, env = "TEMPLATE_STORE_LATENCY_MS", default_value = "0")]
    pub latency_ms: u64,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Template type as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    /// Printable page.
    Pdf,
    /// HTML email body.
    Email,
}

impl From<TypeArg> for TemplateType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Pdf => Self::Pdf,
            TypeArg::Email => Self::Email,
        }
    }
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List saved templates, most recently updated first
    List {
        /// Only templates of this type
        #[arg(long = "type", value_enum)]
        template_type: Option<TypeArg>,
        /// Case-insensitive text in the name or description
        #[arg(long)]
        search: Option<String>,
        /// Required tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Print a template as JSON
    Show {
        /// Template id
        id: String,
    },
    /// Create an empty template and print its id
    New {
        /// Display name
        name: String,
        /// Output medium
        #[arg(long = "type", value_enum, default_value = "pdf")]
        template_type: TypeArg,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a template
    Delete {
        /// Template id
        id: String,
    },
    /// Copy a template and print the copy's id
    Duplicate {
        /// Template id
        id: String,
    },
    /// Write a template's elements as XML
    Export {
        /// Template id
        id: String,
        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Append the elements of an XML file to a template
    Import {
        /// Template id
        id: String,
        /// XML file to read
        file: PathBuf,
    },
    /// Print the drag payloads of the element toolbox as JSON
    Toolbox,
}

/// Open the configured data directory as a template store.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or read.
pub fn open_store(args: &CliArgs) -> anyhow::Result<MemoryTemplateStore> {
    let store = MemoryTemplateStore::with_data_dir(&args.data_dir)
        .with_context(|| format!("Failed to open data directory {}", args.data_dir.display()))?;
    Ok(store.with_latency(Duration::from_millis(args.latency_ms)))
}

/// Run one command and return what it prints.
///
/// # Errors
///
/// Returns an error if the template does not exist, a file cannot be read
/// or written, or an XML document is malformed.
pub async fn run<R>(command: &Command, store: &R) -> anyhow::Result<String>
where
    R: TemplateRepository + ?Sized,
{
    match command {
        Command::List {
            template_type,
            search,
            tags,
        } => {
            let filter = TemplateFilter {
                template_type: template_type.map(Into::into),
                search: search.clone(),
                tags: tags.clone(),
                owner_id: None,
            };
            let templates = store.list(&filter).await?;
            let mut out = String::new();
            for t in &templates {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{} element(s)",
                    t.id,
                    t.template_type,
                    t.name,
                    t.content.len()
                )?;
            }
            Ok(out)
        }
        Command::Show { id } => {
            let template = fetch(store, id).await?;
            Ok(serde_json::to_string_pretty(&template)?)
        }
        Command::New {
            name,
            template_type,
            description,
            tags,
        } => {
            let mut template =
                Template::new(name.clone(), (*template_type).into()).with_tags(tags.clone());
            template.description.clone_from(description);
            let created = store.create(template).await?;
            Ok(created.id)
        }
        Command::Delete { id } => {
            store.delete(id).await?;
            Ok(format!("Deleted {id}"))
        }
        Command::Duplicate { id } => Ok(store.duplicate(id).await?.id),
        Command::Export { id, output } => {
            let template = fetch(store, id).await?;
            let xml = export_xml(&template.content)?;
            match output {
                Some(path) => {
                    std::fs::write(path, &xml)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Exported template {id} to {}", path.display());
                    Ok(format!("Wrote {} element(s) to {}", template.content.len(), path.display()))
                }
                None => Ok(xml),
            }
        }
        Command::Import { id, file } => {
            let xml = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut session = EditorSession::new();
            session.load_template(fetch(store, id).await?);
            let added = session.import_xml(&xml)?;
            let updated = session
                .to_template()
                .context("Session has no template loaded")?;
            store.update(updated).await?;
            Ok(format!("Imported {} element(s) into {id}", added.len()))
        }
        Command::Toolbox => Ok(serde_json::to_string_pretty(&DragPayload::toolbox())?),
    }
}

async fn fetch<R>(store: &R, id: &str) -> anyhow::Result<Template>
where
    R: TemplateRepository + ?Sized,
{
    Ok(store
        .get(id)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?)
}
