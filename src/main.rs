// Vigil — institutional memory and decision gating for a local agent.
//
// Subcommands:
//   run     interactive loop with the background scanner
//   scan    one scan sweep, then exit
//   report  status snapshot, then exit

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::warn;
use parking_lot::Mutex;

use vigil::atoms::error::EngineResult;
use vigil::atoms::types::{EngineConfig, Feedback};
use vigil::engine::agent_loop::Engine;
use vigil::engine::guardrail::Guardrail;
use vigil::engine::paths;
use vigil::engine::providers::OllamaClient;
use vigil::engine::scanner::{self, Scanner};
use vigil::engine::store::{load_engine_config, MemoryStore};
use vigil::engine::vault::Vault;

#[derive(Parser)]
#[command(
    name = "vigil",
    about = "Institutional memory and decision gating for a local agent",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive loop with the background scanner running.
    Run {
        /// Disable the background sensitivity scanner.
        #[arg(long)]
        no_scanner: bool,
    },
    /// Run a single scan sweep and exit.
    Scan,
    /// Print the status report.
    Report,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("vigil: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> EngineResult<()> {
    let store = Arc::new(MemoryStore::open()?);
    let config = load_engine_config(&store);
    let client = Arc::new(OllamaClient::new(&config));
    let guardrail = Arc::new(Mutex::new(Guardrail::new(config.risk_ceiling)));

    if !client.check_reachable() {
        warn!(
            "[vigil] Model server not reachable at {} — replies will degrade to local mode",
            config.llm_base_url
        );
    }

    match cli.command {
        Command::Report => {
            let engine = Engine::new(store, guardrail, client.clone(), client);
            println!("{}", engine.status_report()?);
        }
        Command::Scan => {
            let scanner = build_scanner(&store, &guardrail, &client, &config)?;
            let secured = scanner.sweep();
            println!("Sweep complete: {} file(s) secured.", secured);
        }
        Command::Run { no_scanner } => {
            let stop = Arc::new(AtomicBool::new(false));
            let scanner_handle = if no_scanner {
                None
            } else {
                let scanner = build_scanner(&store, &guardrail, &client, &config)?;
                Some(scanner::spawn(scanner, stop.clone())?)
            };

            let engine = Engine::new(store, guardrail, client.clone(), client);
            interactive_loop(&engine)?;

            stop.store(true, Ordering::Relaxed);
            if let Some(handle) = scanner_handle {
                let _ = handle.join();
            }
        }
    }

    Ok(())
}

fn build_scanner(
    store: &Arc<MemoryStore>,
    guardrail: &Arc<Mutex<Guardrail>>,
    client: &Arc<OllamaClient>,
    config: &EngineConfig,
) -> EngineResult<Scanner> {
    let roots = if config.scan_roots.is_empty() {
        paths::default_scan_roots()
    } else {
        config.scan_roots.clone()
    };
    Ok(Scanner::new(
        store.clone(),
        client.clone(),
        client.clone(),
        guardrail.clone(),
        Vault::open_default()?,
        roots,
        config.sensitivity_threshold,
        Duration::from_secs(config.scan_interval_secs),
    ))
}

fn interactive_loop(engine: &Engine) -> EngineResult<()> {
    println!("vigil — type 'exit' to quit");
    let stdin = io::stdin();

    loop {
        print!("\nyou> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break; // EOF
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        let reply = match engine.handle_request(input) {
            Ok(reply) => reply,
            Err(e) => {
                eprintln!("vigil: request failed: {}", e);
                continue;
            }
        };
        println!("vigil> {}", reply);

        // Post-decision feedback: the turn is always written back; a "no"
        // also records the lesson as a scar.
        print!("[?] was this outcome successful? (yes/no/skip) ");
        io::stdout().flush()?;
        let mut answer = String::new();
        stdin.lock().read_line(&mut answer)?;

        let feedback = match answer.trim().to_lowercase().as_str() {
            "no" | "n" => {
                print!("[!] what went wrong? ");
                io::stdout().flush()?;
                let mut lesson = String::new();
                stdin.lock().read_line(&mut lesson)?;
                let lesson = lesson.trim().to_string();
                if lesson.is_empty() {
                    Feedback::Neutral
                } else {
                    Feedback::Failure { lesson }
                }
            }
            "yes" | "y" => Feedback::Success,
            _ => Feedback::Neutral,
        };

        if let Err(e) = engine.record_feedback(input, &reply, feedback) {
            eprintln!("vigil: could not store feedback: {}", e);
        }
    }

    Ok(())
}
