use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cleandesk_lib::admin;
use cleandesk_lib::config::AppConfig;
use cleandesk_lib::db::Database;
use cleandesk_lib::models::{CreateStaff, StaffPosition};
use cleandesk_lib::store::staff;

#[derive(Parser, Debug)]
#[command(name = "cleandesk-admin")]
#[command(version)]
#[command(about = "Maintenance commands for the CleanDesk database")]
struct Args {
    /// Directory holding cleandesk.toml and the database
    #[arg(long, env = "CLEANDESK_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List staff members, including archived ones
    ListStaff,

    /// Merge duplicate staff records sharing an email into the oldest one
    DedupeStaff {
        #[arg(long)]
        email: String,
    },

    /// Create a staff record for an email unless one already exists
    EnsureStaff {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "Staff")]
        position: String,
    },

    /// Archive a staff member so they drop out of scheduling
    ArchiveStaff {
        #[arg(long)]
        id: String,
    },
}

fn main() {
    cleandesk_lib::init_logging();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> cleandesk_lib::Result<()> {
    let config = AppConfig::load(&args.data_dir)?;
    let db = Database::open(&config.database_path)?;
    db.initialize()?;
    let conn = db.lock()?;

    match args.command {
        Commands::ListStaff => {
            for member in staff::list_staff(&conn, true)? {
                println!(
                    "{}\t{}\t{}\t{}{}",
                    member.id,
                    member.name,
                    member.email,
                    member.position,
                    if member.archived { "\t(archived)" } else { "" }
                );
            }
        }
        Commands::DedupeStaff { email } => {
            let report = admin::dedupe_staff(&conn, &email)?;
            println!(
                "Kept {} ({}); removed {} duplicate(s); updated {} job(s)",
                report.kept.name,
                report.kept.id,
                report.removed.len(),
                report.jobs_updated
            );
        }
        Commands::EnsureStaff {
            name,
            email,
            position,
        } => {
            let position: StaffPosition = position.parse()?;
            let (member, created) = admin::ensure_staff(
                &conn,
                CreateStaff {
                    name,
                    email,
                    position,
                    skills: Vec::new(),
                    location: String::new(),
                    availability: String::new(),
                    avatar: None,
                },
            )?;
            let verb = if created { "Created" } else { "Already present:" };
            println!("{verb} {} ({})", member.name, member.id);
        }
        Commands::ArchiveStaff { id } => {
            let member = staff::set_archived(&conn, &id, true)?;
            println!("Archived {} ({})", member.name, member.id);
        }
    }

    Ok(())
}
