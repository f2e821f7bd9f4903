//! ctr-trace - replay SVC sequences against the HLE kernel
//!
//! Commands:
//! - `ctr-trace run --script <file>` - run a TOML trace script
//! - `ctr-trace handles` - print the hardcoded handle table
//!
//! Usage:
//!   ctr-trace run --script scripts/boot.toml --max-handle 0x100

mod script;
mod trace;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use ctr_kernel::handles;
use ctr_kernel::result::ResultCode;
use ctr_kernel::syscall::numbers;

use crate::script::Script;
use crate::trace::Runner;

#[derive(Parser)]
#[command(name = "ctr-trace")]
#[command(version)]
#[command(about = "Replay scripted SVCs against the CTR HLE kernel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a trace script
    Run {
        /// Path to the TOML script
        #[arg(short, long)]
        script: PathBuf,

        /// Override the highest allocatable handle
        #[arg(long)]
        max_handle: Option<String>,

        /// Override the TLS base address
        #[arg(long)]
        tls_base: Option<String>,
    },

    /// Print the hardcoded handle table
    Handles,
}

fn parse_hex_or_dec(s: &str) -> Result<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).context("Invalid hex number")
    } else {
        s.parse::<u32>().context("Invalid decimal number")
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            max_handle,
            tls_base,
        } => {
            run_script(&script, max_handle.as_deref(), tls_base.as_deref())?;
        }

        Commands::Handles => {
            show_handles();
        }
    }

    Ok(())
}

fn run_script(path: &Path, max_handle: Option<&str>, tls_base: Option<&str>) -> Result<()> {
    let script = Script::load(path)?;

    let mut config = script.kernel.clone();
    if let Some(value) = max_handle {
        config.max_handle = parse_hex_or_dec(value).context("--max-handle")?;
    }
    if let Some(value) = tls_base {
        config.tls_base = parse_hex_or_dec(value).context("--tls-base")?;
    }

    log::info!("Script:     {}", path.display());
    log::info!("Max handle: {:#010X}", config.max_handle);
    log::info!("TLS base:   {:#010X}", config.tls_base);

    let mut runner = Runner::new(&script, config)?;

    for (index, call) in script.calls.iter().enumerate() {
        let name = numbers::name(call.id).unwrap_or("?");
        println!(
            "{} svc {:#04X} {}",
            format!("[{:>3}]", index).dimmed(),
            call.id,
            name.bold()
        );

        runner
            .prepare(call)
            .with_context(|| format!("svc #{} ({})", index, name))?;
        let regs = match runner.step(call) {
            Ok(regs) => regs,
            Err(err) => {
                log::error!("{}", err);
                println!("      {} {}", "fatal:".red().bold(), err);
                return Err(err)
                    .with_context(|| format!("svc #{} ({}) stopped emulation", index, name));
            }
        };

        let status = match ResultCode::from_raw(regs[0]) {
            Some(ResultCode::Success) => "Success".green(),
            Some(code) => code.to_string().yellow(),
            None => "unknown".yellow(),
        };
        println!("      r0 = {:#010X} ({})  r1 = {:#010X}", regs[0], status, regs[1]);

        if let Some(expected) = call.expect_r0 {
            if regs[0] != expected {
                bail!(
                    "svc #{} ({}): expected r0 = {:#010X}, got {:#010X}",
                    index,
                    name,
                    expected,
                    regs[0]
                );
            }
        }
    }

    println!(
        "{} {} calls, {} kernel objects live",
        "✓".green(),
        script.calls.len(),
        runner.kernel.store().len()
    );
    Ok(())
}

fn show_handles() {
    println!("{}", "Hardcoded handles".bold());

    let fixed = [
        (handles::CURRENT_THREAD, "CurrentThread"),
        (handles::CURRENT_PROCESS, "CurrentProcess"),
    ];
    for (handle, name) in fixed {
        println!("  {:#010X}  {:<16} {}", handle, name, "pseudo".dimmed());
    }

    for handle in handles::MIN_SERVICE_HANDLE..=handles::MAX_EVENT_HANDLE {
        let kind = if handles::is_service_handle(handle) {
            "service".cyan()
        } else if handles::is_shared_mem_handle(handle) {
            "shared memory".magenta()
        } else if handles::is_event_handle(handle) {
            "event".yellow()
        } else {
            "unassigned".dimmed()
        };
        println!(
            "  {:#010X}  {:<16} {}",
            handle,
            handles::service_name(handle),
            kind
        );
    }

    println!();
    println!(
        "Dynamic handles: 0x00000000..={:#010X}",
        handles::MAX
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_or_dec() {
        assert_eq!(parse_hex_or_dec("0x100").unwrap(), 0x100);
        assert_eq!(parse_hex_or_dec("0XFF800000").unwrap(), 0xFF80_0000);
        assert_eq!(parse_hex_or_dec("42").unwrap(), 42);
        assert!(parse_hex_or_dec("0xZZ").is_err());
        assert!(parse_hex_or_dec("-1").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "ctr-trace",
            "run",
            "--script",
            "boot.toml",
            "--max-handle",
            "0x10",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                script,
                max_handle,
                tls_base,
            } => {
                assert_eq!(script, PathBuf::from("boot.toml"));
                assert_eq!(max_handle.as_deref(), Some("0x10"));
                assert!(tls_base.is_none());
            }
            Commands::Handles => panic!("expected run"),
        }
    }
}
