use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use togglsync::autotracker::{ActivitySample, Autotracker, AutotrackerRule};
use togglsync::toggl::TogglClient;
use togglsync::user::User;
use togglsync::{storage, sync};

#[derive(Debug, Parser)]
#[command(name = "togglsync", version, about = "Toggl account snapshot sync and autotracker")]
struct Cli {
    /// Log loader and transport details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store the API token used for syncing
    Login { token: String },
    /// Fetch the account snapshot and summarize it
    Sync {
        #[command(flatten)]
        lookup: Lookup,
    },
    /// Load a saved snapshot (.json or .json.gz) and summarize it
    Load {
        path: PathBuf,
        #[command(flatten)]
        lookup: Lookup,
    },
    /// Manage autotracker rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
    /// Match a window title against the autotracker rules
    Track {
        title: String,
        #[arg(long, default_value = "")]
        filename: String,
    },
}

#[derive(Debug, Subcommand)]
enum RulesAction {
    List,
    Add { term: String, project_id: u64 },
}

#[derive(Debug, clap::Args)]
struct Lookup {
    /// Kind of record to print after loading
    #[arg(long, value_enum, requires = "id")]
    kind: Option<EntityKind>,
    #[arg(long, requires = "kind")]
    id: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EntityKind {
    Workspace,
    Client,
    Project,
    Task,
    Tag,
    TimeEntry,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Command::Login { token } => {
            storage::write_token(token.trim())?;
            println!("Token saved.");
        }
        Command::Sync { lookup } => {
            let token = storage::read_token()
                .ok_or("No API token found. Run `togglsync login <TOKEN>` or set TOGGL_API_TOKEN.")?;
            let mut client = TogglClient::new(token.clone())?;
            if let Some(url) = storage::read_config()?.api_url {
                client = client.with_url(url);
            }
            let mut user = User::with_token(token);
            sync::sync_user(&mut user, &client)?;
            print_summary(&user);
            print_lookup(&user, &lookup);
        }
        Command::Load { path, lookup } => {
            let mut user = User::default();
            sync::load_file(&mut user, &path)?;
            print_summary(&user);
            print_lookup(&user, &lookup);
        }
        Command::Rules { action } => match action {
            RulesAction::List => {
                let rules = storage::read_autotracker_rules()?;
                if rules.is_empty() {
                    println!("No autotracker rules configured.");
                }
                for (index, rule) in rules.iter().enumerate() {
                    println!("{}. {rule}", index + 1);
                }
            }
            RulesAction::Add { term, project_id } => {
                let rule = AutotrackerRule::new(term, project_id);
                rule.validate()?;
                storage::add_autotracker_rule(rule)?;
                println!("Rule added.");
            }
        },
        Command::Track { title, filename } => {
            let tracker = Autotracker::new(storage::read_autotracker_rules()?);
            let sample = ActivitySample::new(title, filename);
            match tracker.find_project_id(&sample) {
                Some(project_id) => println!("{project_id}"),
                None => println!("No matching rule."),
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn Error>> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| err.to_string())?;
    Ok(())
}

fn print_summary(user: &User) {
    println!("{user}");
    println!("  workspaces:   {}", user.workspaces.len());
    println!("  clients:      {}", user.clients.len());
    println!("  projects:     {}", user.projects.len());
    println!("  tasks:        {}", user.tasks.len());
    println!("  tags:         {}", user.tags.len());
    println!("  time entries: {}", user.time_entries.len());
}

fn print_lookup(user: &User, lookup: &Lookup) {
    let (Some(kind), Some(id)) = (lookup.kind, lookup.id) else {
        return;
    };
    let found = match kind {
        EntityKind::Workspace => user.workspace_by_id(id).map(ToString::to_string),
        EntityKind::Client => user.client_by_id(id).map(ToString::to_string),
        EntityKind::Project => user.project_by_id(id).map(ToString::to_string),
        EntityKind::Task => user.task_by_id(id).map(ToString::to_string),
        EntityKind::Tag => user.tag_by_id(id).map(ToString::to_string),
        EntityKind::TimeEntry => user.time_entry_by_id(id).map(ToString::to_string),
    };
    match found {
        Some(line) => println!("{line}"),
        None => println!("No {kind:?} with ID {id}."),
    }
}
