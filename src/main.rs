//! rexec 命令行入口

use anyhow::Context;
use clap::{Parser, Subcommand};
use rexec::{
    config::AppConfig,
    models::host::{HostIdentity, OsClass},
    probe::{heading, present},
    prompt::DialoguerPrompt,
    repository::HostRepository,
    services::{ExecMode, HostService, NewHost, RemoteService},
    ssh::{SshTransport, Terminal},
    telemetry,
};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "rexec", version, about = "Remote Execution Tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Add a server
    Add {
        /// linux | windows
        os: OsClass,
        ip: String,
        port: String,
        name: String,
    },
    /// Execute command on remote server
    Exec {
        /// Relay stdin/stdout/stderr concurrently (only before <NAME>)
        #[arg(short, long)]
        interactive: bool,
        name: String,
        /// Remote command and its arguments, passed through unchanged
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        command: Vec<String>,
    },
    /// Test connection to server
    Test { name: String },
    /// rexec <name> test
    #[command(external_subcommand)]
    Legacy(Vec<String>),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    telemetry::init_telemetry(&config.logging);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(run(cli.command, config));
    // 交互模式下 stdin 读取线程可能仍阻塞，不等待它
    runtime.shutdown_timeout(Duration::from_millis(100));

    if let Err(e) = outcome {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    let repo = match &config.store.path {
        Some(path) => HostRepository::new(path),
        None => HostRepository::new(HostRepository::default_path()?),
    };
    let hosts = HostService::new(repo);
    let remote = RemoteService::new(SshTransport::new(config.ssh.connect_timeout()), config);

    match command {
        Commands::Add { os, ip, port, name } => {
            let host = hosts
                .add_host(NewHost { os, ip, port, name }, &mut DialoguerPrompt)
                .context("Add failed")?;
            println!("Server {} added successfully", host.name);
        }
        Commands::Exec {
            interactive,
            name,
            command,
        } => {
            let Some((command, args)) = command.split_first() else {
                anyhow::bail!("Execution failed: missing command");
            };
            let mode = if interactive {
                ExecMode::Interactive
            } else {
                ExecMode::Batch
            };
            execute(&hosts, &remote, &name, command, args, mode)
                .await
                .context("Execution failed")?;
        }
        Commands::Test { name } => {
            test_connection(&hosts, &remote, &name)
                .await
                .context("Test failed")?;
        }
        Commands::Legacy(words) => match words.as_slice() {
            [name, action] if action == "test" => {
                test_connection(&hosts, &remote, name)
                    .await
                    .context("Test failed")?;
            }
            _ => anyhow::bail!("unknown command: {}", words.join(" ")),
        },
    }

    Ok(())
}

async fn execute(
    hosts: &HostService,
    remote: &RemoteService<SshTransport>,
    name: &str,
    command: &str,
    args: &[String],
    mode: ExecMode,
) -> rexec::error::Result<()> {
    let host = hosts.find(name)?;
    print_banner(&host, command, args);
    remote
        .execute(&host, command, args, mode, Terminal::stdio())
        .await
}

fn print_banner(host: &HostIdentity, command: &str, args: &[String]) {
    println!(
        "Executing on server '{}' ({}): {}",
        host.name,
        host.address(),
        command
    );
    if !args.is_empty() {
        println!("Arguments: {}", args.join(" "));
    }
    println!("{}", "-".repeat(40));
}

async fn test_connection(
    hosts: &HostService,
    remote: &RemoteService<SshTransport>,
    name: &str,
) -> rexec::error::Result<()> {
    let host = hosts.find(name)?;
    println!(
        "Testing connection to server '{}' ({})...",
        host.name,
        host.address()
    );

    let probes = remote
        .test_connection(&host, || {
            println!("✓ Connection successful!");
            println!();
            println!("Gathering system information...");
        })
        .await?;

    for line in heading(host.os) {
        println!("{}", line);
    }
    for line in present(&probes, host.os) {
        println!("{}", line);
    }
    Ok(())
}
