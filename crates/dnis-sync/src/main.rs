//! `dnis-sync` command line: print upload plans and run simulated
//! reconciliations against the in-memory gateway

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dnis_core::{
    plan_create, plan_update, Dnis, EntityId, GatewayFailure, InMemoryGateway, IvrConfig,
    Operation,
};
use dnis_sync::{NoDelay, Reconciler, SyncConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("dnis-sync")
        .version(dnis_sync::VERSION)
        .about("Chunked DNIS reconciliation for IVR configs")
        .subcommand_required(true)
        .subcommand(
            Command::new("plan")
                .about("Print the upload plan for a create or update")
                .arg(
                    Arg::new("max-per-request")
                        .long("max-per-request")
                        .default_value("50")
                        .value_parser(value_parser!(usize))
                        .help("Most numbers accepted per write"),
                )
                .arg(
                    Arg::new("desired")
                        .long("desired")
                        .required(true)
                        .value_delimiter(',')
                        .help("Desired numbers, comma separated"),
                )
                .arg(
                    Arg::new("current")
                        .long("current")
                        .value_delimiter(',')
                        .help("Numbers on the existing entity; plans a create when absent"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run a reconciliation against an in-memory gateway")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .default_value("120")
                        .value_parser(value_parser!(u32))
                        .help("Desired number count"),
                )
                .arg(
                    Arg::new("existing")
                        .long("existing")
                        .default_value("0")
                        .value_parser(value_parser!(u32))
                        .help("Numbers already on the entity; runs an update when non-zero"),
                )
                .arg(
                    Arg::new("fail-on-write")
                        .long("fail-on-write")
                        .value_parser(value_parser!(usize))
                        .help("Make the given write fail (1 = initial write)"),
                )
                .arg(
                    Arg::new("no-delay")
                        .long("no-delay")
                        .action(ArgAction::SetTrue)
                        .help("Skip the pause between chunk writes"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("plan", args)) => run_plan(args),
        Some(("simulate", args)) => run_simulate(args).await,
        _ => Ok(()),
    }
}

fn run_plan(args: &ArgMatches) -> anyhow::Result<()> {
    let max = args.get_one::<usize>("max-per-request").copied().unwrap_or(50);
    let desired = numbers_arg(args, "desired");

    let plan = if args.contains_id("current") {
        plan_update(&desired, &numbers_arg(args, "current"), max)?
    } else {
        plan_create(&desired, max)?
    };

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

async fn run_simulate(args: &ArgMatches) -> anyhow::Result<()> {
    let config = match args.get_one::<String>("config") {
        Some(path) => SyncConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => SyncConfig::default(),
    };
    let count = args.get_one::<u32>("count").copied().unwrap_or(120);
    let existing = args.get_one::<u32>("existing").copied().unwrap_or(0);
    let fail_on_write = args.get_one::<usize>("fail-on-write").copied();
    let updating = existing > 0;

    println!("Running DNIS simulation...");
    println!("Desired numbers: {count}");
    println!("Existing numbers: {existing}");
    println!("Max per request: {}", config.max_dnis_per_request);
    println!();

    let mut gateway = InMemoryGateway::new().with_addition_limit(config.max_dnis_per_request);
    if let Some(write) = fail_on_write {
        let (op, call) = match (updating, write) {
            (false, 1) => (Operation::Create, 1),
            (false, n) => (Operation::Update, n.saturating_sub(1)),
            (true, n) => (Operation::Update, n),
        };
        gateway = gateway.fail_on(op, call, GatewayFailure::transport("simulated outage"));
    }
    let gateway = Arc::new(gateway);

    let mut reconciler = Reconciler::new(Arc::clone(&gateway), config);
    if args.get_flag("no-delay") {
        reconciler = reconciler.with_throttle(NoDelay);
    }

    let desired = IvrConfig::new("Simulated IVR").with_dnis(simulated_numbers(count));
    let result = if updating {
        let id = EntityId::from("simulated-ivr");
        gateway.seed(
            id.clone(),
            IvrConfig::new("Simulated IVR").with_dnis(simulated_numbers(existing)),
        );
        reconciler.update(&id, desired).await
    } else {
        reconciler.create(desired).await
    };

    let calls = gateway.calls();
    match result {
        Ok(outcome) => {
            println!("Reconciliation completed:");
            println!("  Writes: {}", outcome.writes);
            println!("  Numbers on entity: {}", outcome.entity.dnis.len());
            println!("  States: {:?}", outcome.history);
            Ok(())
        }
        Err(err) => {
            println!("Reconciliation failed: {err}");
            println!("  Update calls: {}", calls.update);
            println!("  Delete calls: {}", calls.delete);
            println!("  Entities left: {}", gateway.len());
            std::process::exit(1);
        }
    }
}

fn numbers_arg(args: &ArgMatches, id: &str) -> Vec<Dnis> {
    args.get_many::<String>(id)
        .map(|values| values.map(|v| Dnis::from(v.trim())).collect())
        .unwrap_or_default()
}

fn simulated_numbers(count: u32) -> Vec<Dnis> {
    (0..count)
        .map(|i| Dnis::new(format!("+1317555{i:04}")))
        .collect()
}
