// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;

// Use library instead of local modules
use student_registry::{logging, AppConfig, Record, Registrar, StoreContents, WorkflowError};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        None => run_ui_mode(&config),
        Some("list") => {
            logging::init_tracing(&config.log_level)?;
            run_list(&config)
        }
        Some("show") => {
            logging::init_tracing(&config.log_level)?;
            run_show(&config, required_identifier(&args)?)
        }
        Some("delete") => {
            logging::init_tracing(&config.log_level)?;
            run_delete(&config, required_identifier(&args)?)
        }
        Some(other) => {
            eprintln!("❌ Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("   student-registry               interactive UI");
    eprintln!("   student-registry list          list all students");
    eprintln!("   student-registry show <id>     show one student");
    eprintln!("   student-registry delete <id>   delete one student");
}

fn required_identifier(args: &[String]) -> Result<&str> {
    args.get(2)
        .map(String::as_str)
        .context("Missing identifier argument")
}

/// Print workflow failures and exit non-zero
fn report(err: WorkflowError) -> ! {
    for message in err.messages() {
        eprintln!("❌ {}", message);
    }
    std::process::exit(1);
}

fn print_record(record: &Record) {
    println!("  Name:        {}", record.full_name);
    println!("  Identifier:  {}", record.identifier);
    println!("  Email:       {}", record.email);
    if let Some(birth_date) = &record.birth_date {
        println!("  Birth date:  {}", birth_date);
    }
    println!("  Postal code: {}", record.postal_code);
    println!("  Address:     {}, {}", record.address.format(), record.number);
    if !record.complement.is_empty() {
        println!("  Complement:  {}", record.complement);
    }
}

fn run_list(config: &AppConfig) -> Result<()> {
    let registrar = Registrar::from_config(config)?;

    println!("🎓 Registered Students - {}", config.file.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match registrar.list() {
        Ok(StoreContents::Missing) => println!("No registered students found."),
        Ok(StoreContents::Empty) => println!("The student file is empty."),
        Ok(StoreContents::Rows(records)) => {
            for record in &records {
                println!(
                    "{:<11}  {:<30}  {:<30}  {}",
                    record.identifier, record.full_name, record.email, record.address.locality
                );
            }
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("✓ {} students", records.len());
        }
        Err(e) => report(e),
    }

    Ok(())
}

fn run_show(config: &AppConfig, identifier: &str) -> Result<()> {
    let registrar = Registrar::from_config(config)?;

    match registrar.find(identifier) {
        Ok(record) => {
            println!("✓ Registration found:");
            print_record(&record);
            Ok(())
        }
        Err(e) => report(e),
    }
}

fn run_delete(config: &AppConfig, identifier: &str) -> Result<()> {
    let registrar = Registrar::from_config(config)?;

    match registrar.delete(identifier) {
        Ok(()) => {
            println!("✓ Registration {} deleted", identifier);
            Ok(())
        }
        Err(e) => report(e),
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    if let Some(path) = &config.log_file {
        logging::init_file_tracing(&config.log_level, path)?;
    }

    let registrar = Registrar::from_config(config)?;
    let mut app = ui::App::new(registrar);
    ui::run_ui(&mut app)?;

    println!("Thank you for using the system!");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the HTTP API: cargo run --bin registry-server --features server");
    std::process::exit(1);
}
