//! `u-workforce` command line.
//!
//! ```text
//! u-workforce --products products.csv --workers workers.csv --order "Boot=4,Belt=2"
//! ```

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::info;

use u_workforce::export::write_schedule;
use u_workforce::import::load_master_data;
use u_workforce::models::{Order, SkillScale};
use u_workforce::{logging, plan, PlanRequest, PlannerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full plan result as JSON.
    Json,
    /// Schedule grid as CSV.
    Csv,
}

/// Plans an order over a worker roster and prints the schedule.
#[derive(Debug, Parser)]
#[command(name = "u-workforce", version, about)]
struct Cli {
    /// Product catalogue CSV.
    #[arg(long)]
    products: PathBuf,

    /// Worker roster CSV.
    #[arg(long)]
    workers: PathBuf,

    /// Order lines as `product=quantity`, comma-separated.
    #[arg(long, value_parser = parse_order)]
    order: Order,

    /// Planner configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker ids to plan with, comma-separated (default: roster selection).
    #[arg(long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Roster skill cells are 0-1 fractions instead of 0-100.
    #[arg(long)]
    fraction_skills: bool,
}

fn parse_order(text: &str) -> Result<Order, String> {
    let mut order = Order::new();
    for part in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (product, quantity) = part
            .split_once('=')
            .ok_or_else(|| format!("'{part}' is not product=quantity"))?;
        let quantity: u32 = quantity
            .trim()
            .parse()
            .map_err(|_| format!("'{quantity}' is not a quantity"))?;
        order.add(product.trim(), quantity);
    }
    Ok(order)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => PlannerConfig::from_json_file(path)?,
        None => PlannerConfig::default(),
    };
    let scale = if cli.fraction_skills {
        SkillScale::Fraction
    } else {
        SkillScale::Percent
    };

    let data = load_master_data(&cli.products, &cli.workers, &config, scale)?;
    info!(
        products = data.products.len(),
        workers = data.workers.len(),
        "master data loaded"
    );

    let mut request = PlanRequest::new(cli.order);
    if let Some(ids) = cli.select {
        request = request.with_workers(ids);
    }
    let result = plan(&data, &request, &config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &result)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_schedule(&mut out, &result, &data, &config)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order() {
        let order = parse_order("Boot=4, Belt = 2").unwrap();
        assert_eq!(order.total_units(), 6);
        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.lines()[1].product, "Belt");
    }

    #[test]
    fn test_parse_order_rejects_garbage() {
        assert!(parse_order("Boot").is_err());
        assert!(parse_order("Boot=many").is_err());
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from([
            "u-workforce",
            "--products",
            "p.csv",
            "--workers",
            "w.csv",
            "--order",
            "Boot=1",
            "--select",
            "W1,W2",
            "--format",
            "csv",
            "--fraction-skills",
        ])
        .unwrap();
        assert_eq!(cli.select, Some(vec!["W1".to_string(), "W2".to_string()]));
        assert_eq!(cli.format, OutputFormat::Csv);
        assert!(cli.fraction_skills);
    }
}
