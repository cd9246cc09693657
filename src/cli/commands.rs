use crate::config::{LayoutRegistry, SectionLayout};
use crate::error::HotsheetResult;
use crate::logging::RunLog;
use crate::reconcile::{Reconciler, RunInputs, RunState, RunSummary};
use crate::workbook::copy_hotsheet;
use chrono::Local;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Arguments of the reconcile command, as parsed by clap.
#[derive(Debug, Clone)]
pub struct ReconcileArgs {
    pub product: String,
    pub hotsheet: PathBuf,
    pub inventory: Option<PathBuf>,
    pub po: Option<PathBuf>,
    pub bn: Option<PathBuf>,
    pub stock: Option<PathBuf>,
    pub sales: Option<PathBuf>,
    pub section: String,
    pub config: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub working_copy: bool,
    pub json: bool,
    pub progress: bool,
    pub verbose: bool,
}

/// Built-in layouts, or the file at `config` when given.
fn load_registry(config: Option<&Path>) -> HotsheetResult<LayoutRegistry> {
    match config {
        Some(path) => LayoutRegistry::from_path(path),
        None => LayoutRegistry::builtin(),
    }
}

/// Execute the reconcile command
pub fn reconcile(args: ReconcileArgs) -> HotsheetResult<RunSummary> {
    let registry = load_registry(args.config.as_deref())?;
    let mut reconciler = Reconciler::new(&registry, &args.product, &args.section)?
        .with_progress(args.progress);
    let product = reconciler.product().to_string();

    if !args.json {
        println!("{}", "📒 Hotsheet - Reconciling".bold().green());
        println!("   Product:  {}", product.bright_blue().bold());
        println!(
            "   Sections: {}",
            reconciler
                .sections()
                .iter()
                .map(|s| s.sheet.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let hotsheet = if args.working_copy {
        let copy = copy_hotsheet(&product, &args.hotsheet, Local::now().date_naive())?;
        if !args.json {
            println!("   Working copy: {}", copy.display().to_string().cyan());
        }
        copy
    } else {
        args.hotsheet.clone()
    };
    if !args.json {
        println!("   Hotsheet: {}\n", hotsheet.display());
    }

    let log = RunLog::create(
        &args.log_dir,
        &product,
        &args.section,
        Local::now().naive_local(),
        args.verbose,
    )?;
    let inputs = RunInputs {
        hotsheet,
        inventory: args.inventory,
        purchase_orders: args.po,
        bn: args.bn,
        stock: args.stock,
        sales: args.sales,
    };

    let summary = match reconciler.run(&inputs, &log) {
        Ok(summary) => summary,
        Err(e) => {
            if !args.json {
                println!("{}", format!("❌ Run aborted: {}", e).bold().red());
                if let Some(path) = log.path() {
                    println!("   Log: {}", path.display());
                }
            }
            return Err(e);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!("{}", "✅ Hotsheet saved".bold().green());
    for section in &summary.sections {
        println!("   📄 {}", section.section.bright_blue().bold());
        println!(
            "      {} rows: {} updated, {} unmatched, {} skipped",
            section.rows_scanned,
            section.rows_updated.to_string().green(),
            section.rows_unmatched,
            section.rows_skipped
        );
        if section.po_slots_written > 0 {
            println!("      {} PO slots written", section.po_slots_written);
        }
    }
    println!();

    if summary.state == RunState::SavedWithWarnings {
        println!(
            "{}",
            format!(
                "⚠️  {} value(s) could not be read; those rows were skipped.",
                summary.parse_errors()
            )
            .yellow()
        );
    }
    if let Some(path) = &summary.log_file {
        println!("   Log: {}", path.display());
    }
}

/// Execute the copy command
pub fn copy(product: String, hotsheet: PathBuf) -> HotsheetResult<PathBuf> {
    println!("{}", "📒 Hotsheet - Working copy".bold().green());
    let copy = copy_hotsheet(&product, &hotsheet, Local::now().date_naive())?;
    println!("   {} → {}", hotsheet.display(), copy.display().to_string().cyan());
    Ok(copy)
}

/// Execute the layouts command
pub fn layouts(config: Option<PathBuf>, product: Option<String>) -> HotsheetResult<()> {
    let registry = load_registry(config.as_deref())?;
    println!("{}", "📒 Hotsheet - Layouts".bold().green());
    if let Some(path) = &config {
        println!("   File: {} {}", path.display(), "(valid)".green());
    }
    println!();

    match product {
        Some(name) => {
            let (name, layout) = registry.product(&name)?;
            println!("   📦 {}", name.bright_blue().bold());
            for section in &layout.sections {
                print_section(section);
                print_columns(section);
            }
        }
        None => {
            for (name, layout) in &registry.products {
                println!("   📦 {}", name.bright_blue().bold());
                for section in &layout.sections {
                    print_section(section);
                }
            }
        }
    }
    Ok(())
}

fn print_section(section: &SectionLayout) {
    println!(
        "      {:<16} {:<24} {}",
        section.slug().cyan(),
        format!("\"{}\"", section.sheet),
        section.reconcilers().join(", ")
    );
}

fn print_columns(section: &SectionLayout) {
    if let Some(map) = &section.inventory {
        let mut parts = vec![
            format!("sku {}", map.sku),
            format!("on-hand {}", map.on_hand),
        ];
        if map.has_po_slots() {
            let slots: Vec<String> = map
                .po_slots
                .iter()
                .map(|slot| format!("{}/{}", slot.number, slot.quantity))
                .collect();
            parts.push(format!("PO slots {}", slots.join(" ")));
        }
        parts.push(format!("on-PO {}", map.on_po_total));
        parts.push(format!("SO+BO {}", map.on_so_bo));
        if let Some(col) = map.ytd_sold_issued {
            parts.push(format!("YTD {}", col));
        }
        if let Some((sold, issued)) = map.split_ytd_columns() {
            parts.push(format!("YTD sold {} issued {}", sold, issued));
        }
        if let Some(col) = map.average_monthly {
            parts.push(format!("avg {}", col));
        }
        println!("         {}", parts.join(" | "));
        if let Some((ytd, avg)) = map.bn_columns() {
            println!("         BN YTD {} | BN avg {}", ytd, avg);
        }
    }
    if let Some(stock) = &section.stock {
        println!(
            "         stock: sku {} | on-hand {} | on-PO {} | SO+BO {}",
            stock.sku, stock.on_hand, stock.on_po, stock.on_so_bo
        );
    }
    if let Some(sales) = &section.sales {
        println!("         sales: sku {} | YTD {}", sales.sku, sales.ytd);
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
