use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::debug;

use stratus_core::config::NetworkConfig;
use stratus_core::provider::NetworkProvider;
use stratus_core::resource::NetworkHandles;
use stratus_core::workflow::{self, RunReport, StepOutcome, StepRecord};
use stratus_provider_aws::AwsNetworkProvider;

#[derive(Parser)]
#[command(name = "stratus")]
#[command(about = "Provision and tear down AWS VPC networking", long_about = None)]
struct Cli {
    /// Path to the network configuration file
    #[arg(long, global = true, default_value = "network.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the VPC, subnets, route table, internet gateway and default route
    Create,
    /// Tear down everything the configuration describes
    Delete {
        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Show the current state of every configured resource
    Status,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    // Invoked without a subcommand, fall back to asking which way to run.
    let command = match cli.command {
        Some(command) => command,
        None => match prompt_operation() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
        },
    };

    let result = match command {
        Commands::Create => run_create(&cli.config).await,
        Commands::Delete { auto_approve } => run_delete(&cli.config, auto_approve).await,
        Commands::Status => run_status(&cli.config).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn prompt_operation() -> Result<Commands, String> {
    print!("Do you want to create or delete resources? (create/delete): ");
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;

    match input.trim().to_lowercase().as_str() {
        "create" => Ok(Commands::Create),
        "delete" => Ok(Commands::Delete {
            auto_approve: false,
        }),
        other => Err(format!(
            "invalid operation {:?}, expected 'create' or 'delete'",
            other
        )),
    }
}

async fn load(path: &Path) -> Result<(NetworkConfig, AwsNetworkProvider), String> {
    let config = NetworkConfig::load(path).map_err(|e| e.to_string())?;
    debug!("loaded configuration from {}", path.display());
    let provider = AwsNetworkProvider::new(&config.region).await;
    Ok((config, provider))
}

async fn run_create(path: &Path) -> Result<(), String> {
    let (config, provider) = load(path).await?;

    println!("{}", "Creating network resources...".cyan().bold());
    println!();

    let mut handles = NetworkHandles::new();
    let report = workflow::create_network(&provider, &config, &mut handles).await;
    print_report(&report);

    if report.is_success() {
        println!(
            "{}",
            format!(
                "Create complete! {} created, {} reused, {} skipped.",
                report.created(),
                report.reused(),
                report.skipped()
            )
            .green()
            .bold()
        );
        Ok(())
    } else {
        Err(report
            .failure
            .map(|f| f.to_string())
            .unwrap_or_else(|| "create failed".to_string()))
    }
}

async fn run_delete(path: &Path, auto_approve: bool) -> Result<(), String> {
    let (config, provider) = load(path).await?;

    if !auto_approve {
        println!(
            "{}",
            "Do you really want to delete the network resources?"
                .yellow()
                .bold()
        );
        println!(
            "  {}",
            "This action cannot be undone. Type 'yes' to confirm.".yellow()
        );
        print!("\n  Enter a value: ");
        std::io::stdout().flush().map_err(|e| e.to_string())?;

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| e.to_string())?;

        if input.trim() != "yes" {
            println!();
            println!("{}", "Delete cancelled.".yellow());
            return Ok(());
        }
        println!();
    }

    println!("{}", "Deleting network resources...".red().bold());
    println!();

    let mut handles = NetworkHandles::new();
    let report = workflow::delete_network(&provider, &config, &mut handles).await;
    print_report(&report);

    if report.is_success() {
        println!(
            "{}",
            format!(
                "Delete complete! {} deleted, {} skipped.",
                report.deleted(),
                report.skipped()
            )
            .green()
            .bold()
        );
        Ok(())
    } else {
        Err(report
            .failure
            .map(|f| f.to_string())
            .unwrap_or_else(|| "delete failed".to_string()))
    }
}

async fn run_status(path: &Path) -> Result<(), String> {
    let (config, provider) = load(path).await?;

    println!("{}", "Configured resources:".cyan().bold());
    println!();

    let vpc = provider
        .find_vpc(&config.vpc_tags())
        .await
        .map_err(|e| e.to_string())?;
    print_status_line("vpc", &config.vpc_name, vpc.as_deref());

    let subnets = provider
        .subnets_by_prefix(&config.subnet_name_prefix)
        .await
        .map_err(|e| e.to_string())?;
    if subnets.is_empty() {
        print_status_line("subnet", &format!("{}*", config.subnet_name_prefix), None);
    }
    for subnet in &subnets {
        println!(
            "  {} subnet {} ({}) {} {}",
            "•".green(),
            subnet.name,
            subnet.id,
            subnet.cidr_block.dimmed(),
            subnet.availability_zone.dimmed()
        );
    }

    let route_table = provider
        .find_route_table(&config.route_table_tags(), None)
        .await
        .map_err(|e| e.to_string())?;
    print_status_line("route table", &config.route_table_name, route_table.as_deref());

    if let Some(rtb_id) = &route_table {
        let has_route = provider
            .route_exists(rtb_id, &config.destination_cidr)
            .await
            .map_err(|e| e.to_string())?;
        if has_route {
            println!(
                "  {} route {} via internet gateway",
                "•".green(),
                config.destination_cidr
            );
        } else {
            println!(
                "  {} route {} {}",
                "•".yellow(),
                config.destination_cidr,
                "not found".dimmed()
            );
        }
    }

    let gateway = provider
        .find_internet_gateway(&config.gateway_tags())
        .await
        .map_err(|e| e.to_string())?;
    match &gateway {
        Some(info) => {
            let attachment = match &info.attached_vpc {
                Some(vpc_id) => format!("attached to {}", vpc_id),
                None => "detached".to_string(),
            };
            println!(
                "  {} internet gateway {} ({}) {}",
                "•".green(),
                config.gateway_name,
                info.id,
                attachment.dimmed()
            );
        }
        None => print_status_line("internet gateway", &config.gateway_name, None),
    }

    Ok(())
}

fn print_status_line(kind: &str, name: &str, id: Option<&str>) {
    match id {
        Some(id) => println!("  {} {} {} ({})", "•".green(), kind, name, id),
        None => println!("  {} {} {} {}", "•".yellow(), kind, name, "not found".dimmed()),
    }
}

fn print_report(report: &RunReport) {
    for record in &report.records {
        println!("  {}", format_record(record));
    }
    if let Some(failure) = &report.failure {
        println!(
            "  {} {} - {}",
            "✗".red().bold(),
            failure.step,
            failure.error
        );
    }
    println!();
}

fn format_record(record: &StepRecord) -> String {
    match &record.outcome {
        StepOutcome::Created { id } => {
            format!("{} {} ({})", "+".green().bold(), record.step, id)
        }
        StepOutcome::Reused { id } => {
            format!("{} {} ({})", "=".cyan(), record.step, id)
        }
        StepOutcome::Deleted { id } => {
            format!("{} {} ({})", "-".red().bold(), record.step, id)
        }
        StepOutcome::Skipped { reason } => {
            format!("{} {} ({})", "·".dimmed(), record.step, reason.dimmed())
        }
    }
}
