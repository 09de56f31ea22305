//! Materials Manager CLI
//!
//! Command-line front end over the registry library: material CRUD, vendor
//! management, user/job registries, job allocations, snapshot export/import
//! and the remote sync shuttle.

use clap::{Args, Parser, Subcommand, ValueEnum};
use materials_manager::{
    ledger, materials, registry, snapshot, spreadsheet, sync, vendors, web, Error, JobFields,
    MaterialFields, Result, SearchFields, SortKey, UserFields,
};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "materials_manager")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding the registry databases and snapshot file
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    MatId,
    Trade,
    Material,
    Price,
    Vendor,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::MatId => SortKey::MatId,
            SortArg::Trade => SortKey::Trade,
            SortArg::Material => SortKey::MaterialName,
            SortArg::Price => SortKey::Price,
            SortArg::Vendor => SortKey::Vendor,
        }
    }
}

#[derive(Debug, Args)]
struct MaterialArgs {
    #[arg(long)]
    trade: String,
    #[arg(long)]
    material: String,
    #[arg(long, default_value = "GHS")]
    currency: String,
    #[arg(long)]
    price: String,
    #[arg(long)]
    unit: String,
    #[arg(long)]
    vendor: String,
    #[arg(long)]
    vendor_phone: String,
    #[arg(long)]
    vendor_email: String,
    #[arg(long)]
    vendor_location: String,
    /// Defaults to today
    #[arg(long)]
    price_date: Option<String>,
    #[arg(long, default_value = "")]
    comment: String,
}

impl MaterialArgs {
    fn into_fields(self) -> Result<MaterialFields> {
        Ok(MaterialFields {
            trade: self.trade,
            material_name: self.material,
            currency: self.currency,
            price: materials::parse_price(&self.price)?,
            unit: self.unit,
            vendor: self.vendor,
            vendor_phone: self.vendor_phone,
            vendor_email: self.vendor_email,
            vendor_location: self.vendor_location,
            price_date: self
                .price_date
                .unwrap_or_else(|| chrono::Local::now().format(materials::DATE_FORMAT).to_string()),
            comment: self.comment,
        })
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List materials
    List {
        #[arg(long, value_enum, default_value_t = SortArg::MatId)]
        sort: SortArg,
    },
    /// Add a new material
    Add {
        #[command(flatten)]
        material: MaterialArgs,
    },
    /// Overwrite an existing material
    Update {
        mat_id: String,
        #[command(flatten)]
        material: MaterialArgs,
    },
    /// Delete a material
    Delete {
        mat_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Copy a material under a fresh Mat ID
    Duplicate { mat_id: String },
    /// Search materials by substring
    Search {
        term: String,
        /// Also match against Mat IDs
        #[arg(long)]
        include_mat_id: bool,
    },
    /// Compare vendor prices for one material name
    Compare { material_name: String },
    /// Vendor management
    Vendors {
        #[command(subcommand)]
        command: VendorCommand,
    },
    /// User registry
    Users {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Job registry
    Jobs {
        #[command(subcommand)]
        command: JobCommand,
    },
    /// Allocate a material to the default job
    Allocate { mat_id: String },
    /// List the default job's allocations
    Allocations,
    /// Write the snapshot document (materials-data.json)
    ExportJson,
    /// Load the snapshot document into the registries
    ImportJson,
    /// Export materials to a CSV spreadsheet
    ExportCsv { path: PathBuf },
    /// Import materials from a CSV spreadsheet
    ImportCsv {
        path: PathBuf,
        /// Overwrite existing Mat IDs instead of re-inserting them under fresh ids
        #[arg(long)]
        update: bool,
    },
    /// Upload the snapshot to the sync endpoint
    Upload { url: String },
    /// Download the hosted snapshot and load it into the registries
    Download { url: String },
    /// Serve the snapshot sync endpoint
    Serve {
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[derive(Debug, Subcommand)]
enum VendorCommand {
    /// List distinct vendors
    List,
    /// Rewrite a vendor's details on all of its materials
    Update {
        name: String,
        /// New vendor name (defaults to the current one)
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        location: String,
    },
    /// Delete a vendor and every material referencing it
    Delete {
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        position: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
    },
    List,
    Edit {
        user_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        position: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
    },
    /// Make this user the current default
    SetDefault { user_id: i64 },
    Delete {
        user_id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum JobCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        location: String,
    },
    List,
    Edit {
        job_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        location: String,
    },
    /// Make this job the current default
    SetDefault { job_id: i64 },
    Delete {
        job_id: i64,
        #[arg(long)]
        yes: bool,
    },
}

/// Asks the user to confirm a destructive operation on stdin.
fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_material(record: &materials_manager::MaterialRecord) {
    println!(
        "{}\t{}\t{}\t{} {:.2}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        record.mat_id,
        record.trade,
        record.material_name,
        record.currency,
        record.price,
        record.unit,
        record.vendor,
        record.vendor_phone,
        record.vendor_email,
        record.vendor_location,
        record.price_date,
        record.comment,
    );
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let data_dir = cli.data_dir;
    let snapshot_path = data_dir.join(snapshot::SNAPSHOT_FILE);

    match cli.command {
        Command::List { sort } => {
            let conn = materials::open(&data_dir)?;
            for record in materials::sort_materials(&conn, sort.into())? {
                print_material(&record);
            }
        }
        Command::Add { material } => {
            let mut conn = materials::open(&data_dir)?;
            let mat_id = materials::add_material(&mut conn, &material.into_fields()?)?;
            println!("Added {}", mat_id);
        }
        Command::Update { mat_id, material } => {
            let conn = materials::open(&data_dir)?;
            materials::update_material(&conn, &mat_id, &material.into_fields()?)?;
            println!("Updated {}", mat_id);
        }
        Command::Delete { mat_id, yes } => {
            let conn = materials::open(&data_dir)?;
            let record = materials::get_material(&conn, &mat_id)?;
            let prompt = format!(
                "Are you sure you want to delete [{}] {}?",
                record.mat_id, record.material_name
            );
            if yes || confirm(&prompt) {
                materials::delete_material(&conn, &mat_id)?;
                println!("Deleted {}", mat_id);
            }
        }
        Command::Duplicate { mat_id } => {
            let mut conn = materials::open(&data_dir)?;
            let new_id = materials::duplicate_material(&mut conn, &mat_id)?;
            println!("Material duplicated successfully with Mat ID {}", new_id);
        }
        Command::Search { term, include_mat_id } => {
            let conn = materials::open(&data_dir)?;
            let fields = SearchFields {
                mat_id: include_mat_id,
                ..SearchFields::default()
            };
            for record in materials::search_materials(&conn, &term, &fields)? {
                print_material(&record);
            }
        }
        Command::Compare { material_name } => {
            let conn = materials::open(&data_dir)?;
            let comparison = materials::compare_prices(&conn, &material_name)?;
            for record in &comparison.records {
                print_material(record);
            }
            match (&comparison.currency, comparison.average_price) {
                (Some(currency), Some(average)) => {
                    println!("Average Price : {} {:.2}", currency, average);
                }
                _ => println!("Average prices cannot be calculated due to currency variance."),
            }
        }
        Command::Vendors { command } => run_vendors(command, &data_dir)?,
        Command::Users { command } => run_users(command, &data_dir)?,
        Command::Jobs { command } => run_jobs(command, &data_dir)?,
        Command::Allocate { mat_id } => {
            let materials_conn = materials::open(&data_dir)?;
            let jobs_conn = registry::open_jobs(&data_dir)?;
            let inserted =
                ledger::allocate_to_default_job(&materials_conn, &jobs_conn, &data_dir, &mat_id)?;
            if inserted {
                println!("Material {} allocated to the current job.", mat_id);
            } else {
                println!("Material {} was already allocated to the current job.", mat_id);
            }
        }
        Command::Allocations => {
            let jobs_conn = registry::open_jobs(&data_dir)?;
            let job = registry::default_job(&jobs_conn)?.ok_or(Error::NoDefaultJob)?;
            println!("Allocations for {} ({})", job.job_name, job.job_code);
            for record in ledger::list_allocations(&data_dir, &job)? {
                print_material(&record);
            }
        }
        Command::ExportJson => {
            let materials_conn = materials::open(&data_dir)?;
            let users_conn = registry::open_users(&data_dir)?;
            let jobs_conn = registry::open_jobs(&data_dir)?;
            let document = snapshot::export_all(&materials_conn, &users_conn, &jobs_conn)?;
            snapshot::write_snapshot(&document, &snapshot_path)?;
            println!("Snapshot written to {}", snapshot_path.display());
        }
        Command::ImportJson => {
            let document = snapshot::read_snapshot(&snapshot_path)?;
            let mut materials_conn = materials::open(&data_dir)?;
            let mut users_conn = registry::open_users(&data_dir)?;
            let mut jobs_conn = registry::open_jobs(&data_dir)?;
            snapshot::import_all(&document, &mut materials_conn, &mut users_conn, &mut jobs_conn)?;
            println!("Snapshot imported from {}", snapshot_path.display());
        }
        Command::ExportCsv { path } => {
            let conn = materials::open(&data_dir)?;
            spreadsheet::export_csv(&conn, &path)?;
            println!("Data exported successfully to {}", path.display());
        }
        Command::ImportCsv { path, update } => {
            let mut conn = materials::open(&data_dir)?;
            let mode = if update {
                spreadsheet::DuplicateMode::Update
            } else {
                spreadsheet::DuplicateMode::Skip
            };
            let report = spreadsheet::import_csv(&mut conn, &path, mode)?;
            if !report.inserted.is_empty() {
                println!("Inserted material IDs: {}", report.inserted.join(", "));
            }
            if !report.updated.is_empty() {
                println!("Updated material IDs: {}", report.updated.join(", "));
            }
            for (old_id, new_id) in &report.reinserted {
                println!("Skipped duplicate {} (re-added as {})", old_id, new_id);
            }
            for (line, reason) in &report.invalid {
                println!("Row {}: invalid ({})", line, reason);
            }
        }
        Command::Upload { url } => {
            // Posting to the shared endpoint requires a current user identity
            let users_conn = registry::open_users(&data_dir)?;
            let user = registry::default_user(&users_conn)?.ok_or(Error::NoDefaultUser)?;
            let materials_conn = materials::open(&data_dir)?;
            let jobs_conn = registry::open_jobs(&data_dir)?;
            let document = snapshot::export_all(&materials_conn, &users_conn, &jobs_conn)?;
            snapshot::write_snapshot(&document, &snapshot_path)?;
            sync::upload(&url, &document).await?;
            println!("Data uploaded successfully ({})", user.name);
        }
        Command::Download { url } => {
            let document = sync::download(&url).await?;
            snapshot::write_snapshot(&document, &snapshot_path)?;
            let mut materials_conn = materials::open(&data_dir)?;
            let mut users_conn = registry::open_users(&data_dir)?;
            let mut jobs_conn = registry::open_jobs(&data_dir)?;
            snapshot::import_all(&document, &mut materials_conn, &mut users_conn, &mut jobs_conn)?;
            println!("Database updated successfully!");
        }
        Command::Serve { port } => {
            web::serve(snapshot_path, port).await?;
        }
    }

    Ok(())
}

fn run_vendors(command: VendorCommand, data_dir: &std::path::Path) -> Result<()> {
    let conn = materials::open(data_dir)?;
    match command {
        VendorCommand::List => {
            for vendor in vendors::list_vendors(&conn)? {
                println!(
                    "{}\t{}\t{}\t{}",
                    vendor.name, vendor.phone, vendor.email, vendor.location
                );
            }
        }
        VendorCommand::Update {
            name,
            rename,
            phone,
            email,
            location,
        } => {
            let details = vendors::Vendor {
                name: rename.unwrap_or_else(|| name.clone()),
                phone,
                email,
                location,
            };
            let touched = vendors::update_vendor(&conn, &name, &details)?;
            println!("Updated {} material(s) for vendor '{}'.", touched, name);
        }
        VendorCommand::Delete { name, yes } => {
            let count = vendors::material_count_for_vendor(&conn, &name)?;
            let prompt = format!(
                "Are you sure you want to delete all {} entr(ies) associated with vendor '{}'?",
                count, name
            );
            if yes || confirm(&prompt) {
                let removed = vendors::delete_vendor(&conn, &name)?;
                println!("All {} entr(ies) for vendor '{}' have been deleted.", removed, name);
            }
        }
    }
    Ok(())
}

fn run_users(command: UserCommand, data_dir: &std::path::Path) -> Result<()> {
    let mut conn = registry::open_users(data_dir)?;
    match command {
        UserCommand::Add {
            name,
            company,
            position,
            phone,
            email,
        } => {
            let user = registry::add_user(
                &mut conn,
                &UserFields {
                    name,
                    company,
                    position,
                    phone,
                    email,
                },
            )?;
            println!("Added {} ({})", user.user_code, user.name);
        }
        UserCommand::List => {
            for user in registry::list_users(&conn)? {
                let marker = if user.is_default { " [current]" } else { "" };
                println!(
                    "{}\t{}\t{}\t{}\t{}{}",
                    user.user_id, user.user_code, user.name, user.company, user.email, marker
                );
            }
        }
        UserCommand::Edit {
            user_id,
            name,
            company,
            position,
            phone,
            email,
        } => {
            registry::update_user(
                &conn,
                user_id,
                &UserFields {
                    name,
                    company,
                    position,
                    phone,
                    email,
                },
            )?;
            println!("User {} updated successfully!", user_id);
        }
        UserCommand::SetDefault { user_id } => {
            registry::set_default_user(&mut conn, user_id)?;
            let user = registry::get_user(&conn, user_id)?;
            println!("{} has been set as the default user.", user.name);
        }
        UserCommand::Delete { user_id, yes } => {
            let user = registry::get_user(&conn, user_id)?;
            let prompt = format!("Delete {} from the existing users?", user.name);
            if yes || confirm(&prompt) {
                registry::delete_user(&conn, user_id)?;
                println!("{} has been deleted successfully.", user.name);
            }
        }
    }
    Ok(())
}

fn run_jobs(command: JobCommand, data_dir: &std::path::Path) -> Result<()> {
    let mut conn = registry::open_jobs(data_dir)?;
    match command {
        JobCommand::Add {
            name,
            client,
            location,
        } => {
            let job = registry::add_job(
                &mut conn,
                &JobFields {
                    job_name: name,
                    client,
                    location,
                },
            )?;
            println!("Added {} ({})", job.job_code, job.job_name);
        }
        JobCommand::List => {
            for job in registry::list_jobs(&conn)? {
                let marker = if job.is_default { " [current]" } else { "" };
                println!(
                    "{}\t{}\t{}\t{}\t{}{}",
                    job.job_id, job.job_code, job.job_name, job.client, job.location, marker
                );
            }
        }
        JobCommand::Edit {
            job_id,
            name,
            client,
            location,
        } => {
            registry::update_job(
                &conn,
                job_id,
                &JobFields {
                    job_name: name,
                    client,
                    location,
                },
            )?;
            println!("Job {} updated successfully!", job_id);
        }
        JobCommand::SetDefault { job_id } => {
            registry::set_default_job(&mut conn, job_id)?;
            let job = registry::get_job(&conn, job_id)?;
            println!("{} has been set as the default Job.", job.job_name);
        }
        JobCommand::Delete { job_id, yes } => {
            let job = registry::get_job(&conn, job_id)?;
            let prompt = format!("Delete {} from the existing jobs?", job.job_name);
            if yes || confirm(&prompt) {
                registry::delete_job(&conn, job_id)?;
                println!("{} has been deleted successfully.", job.job_name);
            }
        }
    }
    Ok(())
}
