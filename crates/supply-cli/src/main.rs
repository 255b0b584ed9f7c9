use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use contracts::DemandRow;
use supply_api::{
    serve, DemandCsvStore, ScriptRunner, ServiceConfig, WorkflowApi, DEFAULT_LEDGER_CALLER,
    PRODUCTS_PER_PAGE,
};

fn print_usage() {
    println!("supply-cli <command>");
    println!("commands:");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
    println!("    reads SUPPLY_* environment variables, see README");
    println!("  create <product_id> <product_name>");
    println!("  list [page]");
    println!("  transfer <product_id> <new_owner> <details>");
    println!("  cancel <product_id> <new_owner>");
    println!("  append <csv_path> <date> <product_id> <location_id> <demand> <price>");
    println!("  forecast <script> <data_path>");
    println!("  risk <script> <data_path>");
}

fn parse_product_id(value: Option<&String>) -> Result<u64, String> {
    let raw = value.ok_or_else(|| "missing product_id".to_string())?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid product_id: {raw}"))
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn ledger_caller() -> String {
    env::var("SUPPLY_LEDGER_CALLER")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LEDGER_CALLER.to_string())
}

fn runner_timeout() -> Duration {
    let secs = env::var("SUPPLY_RUNNER_TIMEOUT_SECS")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(120);
    Duration::from_secs(secs)
}

// Ledger commands run against a fresh in-process ledger; they demonstrate the
// workflow without a server.
fn run_create(args: &[String]) -> Result<(), String> {
    let product_id = parse_product_id(args.get(2))?;
    let product_name = args
        .get(3)
        .cloned()
        .ok_or_else(|| "missing product_name".to_string())?;

    let mut workflow = WorkflowApi::new(&ledger_caller());
    let receipt = workflow
        .create_product(product_id, &product_name)
        .map_err(|err| err.to_string())?;
    println!("created product_id={product_id} {receipt}");
    Ok(())
}

fn run_list(args: &[String]) -> Result<(), String> {
    let page = args
        .get(2)
        .map(|raw| raw.parse::<usize>().map_err(|_| format!("invalid page: {raw}")))
        .transpose()?
        .unwrap_or(1)
        .max(1);

    let mut workflow = WorkflowApi::new(&ledger_caller());
    let listing = workflow
        .list_page(page, PRODUCTS_PER_PAGE)
        .map_err(|err| err.to_string())?;

    println!(
        "page {}/{} ({} products)",
        listing.page,
        listing.total_pages.max(1),
        listing.total_products
    );
    for view in &listing.products {
        match &view.pending_transfer {
            Some(new_owner) => println!(
                "  {} {} owner={} pending_transfer={new_owner}",
                view.record.product_id, view.record.product_name, view.record.owner
            ),
            None => println!(
                "  {} {} owner={}",
                view.record.product_id, view.record.product_name, view.record.owner
            ),
        }
    }
    Ok(())
}

fn run_transfer(args: &[String]) -> Result<(), String> {
    let product_id = parse_product_id(args.get(2))?;
    let new_owner = args
        .get(3)
        .cloned()
        .ok_or_else(|| "missing new_owner".to_string())?;
    let details = args
        .get(4)
        .cloned()
        .ok_or_else(|| "missing details".to_string())?;

    let mut workflow = WorkflowApi::new(&ledger_caller());
    workflow
        .create_product(product_id, "cli product")
        .map_err(|err| err.to_string())?;
    let receipt = workflow
        .transfer_product(product_id, &new_owner, &details)
        .map_err(|err| err.to_string())?;
    println!("transferred product_id={product_id} to={new_owner} {receipt}");
    Ok(())
}

fn run_cancel(args: &[String]) -> Result<(), String> {
    let product_id = parse_product_id(args.get(2))?;
    let new_owner = args
        .get(3)
        .cloned()
        .ok_or_else(|| "missing new_owner".to_string())?;

    // Walks the full lifecycle so there is a transfer to cancel: the new
    // owner hands the product back to the original caller.
    let mut workflow = WorkflowApi::new(&ledger_caller());
    workflow
        .create_product(product_id, "cli product")
        .map_err(|err| err.to_string())?;
    workflow
        .transfer_product(product_id, &new_owner, "cli transfer")
        .map_err(|err| err.to_string())?;
    workflow.ledger_mut().set_caller(&new_owner);
    let receipt = workflow
        .cancel_transfer(product_id)
        .map_err(|err| err.to_string())?;
    println!("cancelled transfer of product_id={product_id} {receipt}");
    Ok(())
}

fn run_append(args: &[String]) -> Result<(), String> {
    let [csv_path, date, product_id, location_id, demand, price] = match args.get(2..8) {
        Some(rest) => [&rest[0], &rest[1], &rest[2], &rest[3], &rest[4], &rest[5]],
        None => return Err("append needs 6 arguments".to_string()),
    };
    let product_id = product_id
        .parse::<u64>()
        .map_err(|_| format!("invalid product_id: {product_id}"))?;

    let store = DemandCsvStore::new(csv_path);
    let row = DemandRow {
        date: date.clone(),
        product_id,
        location_id: location_id.clone(),
        demand: demand.clone(),
        price: price.clone(),
    };
    store.append_row(&row).map_err(|err| err.to_string())?;
    println!("appended to {}: {}", csv_path, row.to_csv_line());
    Ok(())
}

async fn run_model(args: &[String], label: &str) -> Result<(), String> {
    let script = args
        .get(2)
        .cloned()
        .ok_or_else(|| "missing script".to_string())?;
    let data_path = args
        .get(3)
        .cloned()
        .ok_or_else(|| "missing data_path".to_string())?;

    let python_bin = env::var("SUPPLY_PYTHON_BIN")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "python3".to_string());
    let runner = ScriptRunner::standalone(python_bin, script, runner_timeout());
    let output = runner.run(&data_path).await.map_err(|err| err.to_string())?;
    println!("{label} output:");
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    let result = match command {
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => match ServiceConfig::from_env() {
                Ok(config) => {
                    println!("serving api on http://{addr}");
                    serve(addr, config).await.map_err(|err| err.to_string())
                }
                Err(err) => Err(err.to_string()),
            },
            Err(err) => Err(err),
        },
        Some("create") => run_create(&args),
        Some("list") => run_list(&args),
        Some("transfer") => run_transfer(&args),
        Some("cancel") => run_cancel(&args),
        Some("append") => run_append(&args),
        Some("forecast") => run_model(&args, "forecast").await,
        Some("risk") => run_model(&args, "risk").await,
        _ => {
            print_usage();
            return;
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        print_usage();
        std::process::exit(2);
    }
}
