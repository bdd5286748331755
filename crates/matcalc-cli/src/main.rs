use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use matcalc_core::{Catalog, Estimate, EstimateRequest, Estimator};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "matcalc")]
#[command(about = "Floor mat calculator - estimate tiles, rolls and prices for your rooms", long_about = None)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate materials and price for a set of spaces
    Estimate {
        /// Request file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the full estimate (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Price catalog replacing the built-in one (YAML or JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// List products, thicknesses and roll widths of a catalog
    Catalog {
        /// Price catalog replacing the built-in one (YAML or JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Estimate {
            input,
            output,
            catalog,
        } => {
            estimate_command(input, output, catalog)?;
        }
        Commands::Catalog { catalog } => {
            catalog_command(catalog)?;
        }
    }

    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?
    };
    Ok(value)
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading catalog");
            load(path)
        }
        None => Ok(Catalog::builtin()),
    }
}

fn estimate_command(
    input: PathBuf,
    output: Option<PathBuf>,
    catalog: Option<PathBuf>,
) -> Result<()> {
    println!("{}", "🔍 Loading request...".bright_blue());

    let request: EstimateRequest = load(&input)?;
    let catalog = load_catalog(catalog.as_deref())?;

    println!(
        "  {} spaces, product {} {}",
        request.spaces.len().to_string().bright_white().bold(),
        request.product.bright_white(),
        request.thickness.bright_white()
    );
    println!();

    let estimator = Estimator::new(request, &catalog)?;
    let estimate = estimator.estimate();

    print_estimate(&estimate);

    let json = serde_json::to_string_pretty(&estimate)?;
    if let Some(output_path) = output {
        std::fs::write(&output_path, json)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        println!(
            "💾 Saved estimate to {}",
            output_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn print_estimate(estimate: &Estimate) {
    println!("{}", "📊 Spaces:".bright_yellow().bold());
    for space in &estimate.spaces {
        let result = &space.result;
        println!(
            "  {} ({}×{}cm, {}): {}",
            space.name.bright_white().bold(),
            space.width,
            space.height,
            space.product_type,
            format_price(result.price).bright_green()
        );
        println!("    {}", result.label);
        for item in &result.breakdown {
            println!("    • {}", item);
        }
        for message in &result.fit_messages {
            let line = message.to_string();
            if message.needs_trim() {
                println!("    {}", line.yellow());
            } else if message.leaves_gap() {
                println!("    {}", line.red());
            } else {
                println!("    {}", line.green());
            }
        }
        for memo in &result.shipping_memos {
            println!("    {}", memo.to_string().bright_cyan());
        }
    }
    println!();

    let summary = &estimate.summary;
    println!("{}", "✅ Summary".bright_green().bold());
    println!("  Spaces priced: {}", summary.active_spaces);
    if summary.tiles_100 > 0 {
        println!("  100cm tiles: {}", summary.tiles_100);
    }
    if summary.packs_50 > 0 {
        println!("  50cm tile packs: {}", summary.packs_50);
    }
    if summary.total_rolls > 0 {
        println!("  Rolls: {}", summary.total_rolls);
    }
    if let Some(note) = summary.fit_note() {
        println!("  {}", note);
    }
    println!(
        "  Total: {}",
        format_price(summary.total_price).bright_white().bold()
    );
    println!();
}

/// Formats a price with thousands separators, `1234500` → `1,234,500`
fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn catalog_command(catalog: Option<PathBuf>) -> Result<()> {
    let catalog = load_catalog(catalog.as_deref())?;

    println!("{}", "📦 Products:".bright_yellow().bold());
    for (id, product) in &catalog.products {
        println!("  {} ({})", id.bright_white().bold(), product.name);
        for thickness in product.thicknesses() {
            let widths = product.available_widths(thickness);
            if widths.is_empty() {
                println!("    • {}", thickness);
            } else {
                let widths: Vec<String> = widths.iter().map(|w| format!("{w}cm")).collect();
                println!("    • {}: {}", thickness, widths.join(", "));
            }
        }
    }

    Ok(())
}
