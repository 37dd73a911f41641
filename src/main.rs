//! CuraVault command-line client.
//!
//! ```text
//!   curavault connect                  authorize the local wallet
//!   curavault upload report.pdf        store on IPFS, register on chain
//!   curavault records                  list registered records
//!   curavault grant 0xDOCTOR           let a doctor read your records
//! ```

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use curavault::blockchain::types::AccountAddress;
use curavault::blockchain::wallet::{address_for_private_key, auto_approve, generate_private_key_hex};
use curavault::blockchain::wallet::{ApprovalHook, ApprovalRequest, PRIVATE_KEY_ENV_VAR};
use curavault::blockchain::ChainReader;
use curavault::config::{load_or_default, VaultConfig};
use curavault::observability::{logging, metrics};
use curavault::storage::ContentId;
use curavault::VaultError;

#[derive(Parser)]
#[command(name = "curavault")]
#[command(about = "Health records on Aptos and IPFS", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Approve wallet prompts without asking
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new private key for the local wallet
    Keygen,
    /// Authorize the local wallet and start a session
    Connect,
    /// End the session
    Disconnect,
    /// Show session, provider and node status
    Status,
    /// Upload a file and register it on chain
    Upload { path: PathBuf },
    /// List records stored under an account (default: connected account)
    Records {
        #[arg(long)]
        patient: Option<AccountAddress>,
    },
    /// Download a record through the gateway
    Fetch {
        cid: ContentId,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Grant a doctor access to your records
    Grant { doctor: AccountAddress },
    /// Revoke a doctor's access
    Revoke { doctor: AccountAddress },
    /// Ask the chain whether a doctor may read a patient's records
    /// (default patient: connected account)
    Check {
        doctor: AccountAddress,
        #[arg(long)]
        patient: Option<AccountAddress>,
    },
    /// Read a raw account resource
    Resource {
        address: AccountAddress,
        resource_type: String,
    },
    /// Call a view function; arguments are JSON values
    View { function: String, arguments: Vec<String> },
}

/// Ask on the terminal. Anything but `y`/`yes` declines.
///
/// Needs the multi-threaded runtime `#[tokio::main]` provides.
fn terminal_approval() -> ApprovalHook {
    Arc::new(|request: &ApprovalRequest<'_>| {
        let question = match request {
            ApprovalRequest::Connect { address } => format!("Connect account {} to CuraVault?", address),
            ApprovalRequest::Sign { payload } => format!(
                "Sign and submit {}({})?",
                payload.function(),
                payload
                    .arguments()
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };

        // blocking read inside an async wallet call
        tokio::task::block_in_place(|| {
            eprint!("{} [y/N] ", question);
            std::io::stderr().flush().ok();

            let mut answer = String::new();
            if std::io::stdin().lock().read_line(&mut answer).is_err() {
                return false;
            }
            matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
    })
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, config: VaultConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Keygen = cli.command {
        let key = generate_private_key_hex();
        let address = address_for_private_key(&key)?;
        println!("export {}={}", PRIVATE_KEY_ENV_VAR, key);
        eprintln!("Address: {}", address);
        return Ok(());
    }

    let approval = if cli.yes { auto_approve() } else { terminal_approval() };
    let runtime = curavault::start(&config, approval).await?;
    let vault = &runtime.vault;
    let session = vault.session();

    match cli.command {
        Commands::Keygen => {}
        Commands::Connect => {
            let address = session.connect().await.map_err(VaultError::from)?;
            println!("Connected {}", address);
        }
        Commands::Disconnect => {
            session.disconnect().await.map_err(VaultError::from)?;
            println!("Disconnected");
        }
        Commands::Status => {
            let current = session.current();
            let ledger = runtime.node.ledger_info().await.ok();
            print_json(&json!({
                "provider_present": session.binding().detect(),
                "install_url": session.binding().install_url(),
                "connected": current.connected,
                "address": current.address,
                "node": runtime.node.base_url(),
                "chain_id": ledger.as_ref().map(|l| l.chain_id),
                "ledger_version": ledger.as_ref().map(|l| l.ledger_version),
                "module": vault.module_address(),
            }))?;
        }
        Commands::Upload { path } => {
            let bytes = tokio::fs::read(&path).await?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "record".to_string());
            let receipt = vault.upload_record(bytes, &name).await?;
            print_json(&receipt)?;
        }
        Commands::Records { patient } => {
            let patient = patient.or(session.current().address).ok_or(VaultError::NotConnected)?;
            let records = vault.list_records(&patient).await?;
            if records.is_empty() {
                println!("No records yet.");
            } else {
                print_json(&records)?;
            }
        }
        Commands::Fetch { cid, out } => {
            let bytes = vault.fetch_record(&cid).await?;
            match out {
                Some(out) => {
                    tokio::fs::write(&out, &bytes).await?;
                    eprintln!("Wrote {} bytes to {}", bytes.len(), out.display());
                }
                None => std::io::stdout().write_all(&bytes)?,
            }
        }
        Commands::Grant { doctor } => {
            print_json(&vault.grant_access(&doctor).await?)?;
        }
        Commands::Revoke { doctor } => {
            print_json(&vault.revoke_access(&doctor).await?)?;
        }
        Commands::Check { doctor, patient } => {
            let patient = patient.or(session.current().address).ok_or(VaultError::NotConnected)?;
            let granted = vault.refresh_access(&patient, &doctor).await?;
            println!("{}", if granted { "Access granted" } else { "No access" });
        }
        Commands::Resource { address, resource_type } => {
            let data = vault
                .reader()
                .fetch_resource(&address, &resource_type)
                .await
                .map_err(VaultError::from)?;
            print_json(&data)?;
        }
        Commands::View { function, arguments } => {
            let arguments = arguments
                .iter()
                .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())))
                .collect();
            let values = vault
                .reader()
                .fetch_view(&function, arguments)
                .await
                .map_err(VaultError::from)?;
            print_json(&values)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<VaultError>() {
                Some(vault_error) => eprintln!("{}", vault_error.status_text()),
                None => eprintln!("Error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}
