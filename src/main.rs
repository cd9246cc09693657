use clap::{Parser, Subcommand};
use hotsheet_sync::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hotsheet")]
#[command(about = "Reconcile product hotsheets against ERP inventory, PO and sales extracts.")]
#[command(long_about = "Hotsheet - keeps per-product tracking sheets in sync with ERP extracts

Each product hotsheet has one row per SKU, grouped into sections (worksheets).
A run matches every SKU against the extracts and writes the figures back into
the mapped hotsheet columns, in place.

COMMANDS:
  reconcile - Update a hotsheet from ERP extracts
  copy      - Make a dated working copy of a hotsheet
  layouts   - List products, sections and column maps

EXAMPLES:
  hotsheet reconcile --product BJP --hotsheet BJP.xlsx \\
      --inventory inv.xlsx --po po.xlsx --bn bn.xlsx
  hotsheet reconcile --product BSC --section winter --hotsheet BSC.xlsx \\
      --stock stock.xlsx --sales sales.xlsx --working-copy
  hotsheet layouts --product SMD")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Update a hotsheet from ERP extracts.

PRODUCTS:
  BJP                       inventory + PO extracts (BN optional)
  BSC-INV, 21C-INV, SMD-INV inventory extract only
  BSC, 21C, SMD             legacy stock and/or sales extracts

SECTIONS:
  --section picks one worksheet by slug or sheet name (see 'hotsheet layouts').
  Omit it, or pass 'all', to run every section of the product.

OUTPUT:
  The hotsheet is saved once, after every section succeeded. A fatal error
  (missing sheet, non-numeric PO number, unreadable workbook) leaves the file
  untouched. Unreadable numbers skip their row and are reported as warnings.

  Every comparison, match and skip is written to
  <log-dir>/<YYYY-MM-DD_HH-MM-SS>_<product>_<section>.log

EXAMPLES:
  hotsheet reconcile -p BJP --hotsheet BJP.xlsx --inventory inv.xlsx --po po.xlsx
  hotsheet reconcile -p 21C --hotsheet 21C.xlsx --stock stock.xlsx --sales sales.xlsx --json")]
    /// Update a hotsheet from ERP extracts
    Reconcile {
        /// Product line (BJP, BSC, 21C, SMD or one from --config)
        #[arg(short, long)]
        product: String,

        /// Hotsheet workbook to update (.xlsx)
        #[arg(long)]
        hotsheet: PathBuf,

        /// Inventory extract
        #[arg(long)]
        inventory: Option<PathBuf>,

        /// Purchase-order extract
        #[arg(long)]
        po: Option<PathBuf>,

        /// BN overlay extract
        #[arg(long)]
        bn: Option<PathBuf>,

        /// Legacy stock extract
        #[arg(long)]
        stock: Option<PathBuf>,

        /// Legacy sales extract
        #[arg(long)]
        sales: Option<PathBuf>,

        /// Section slug or sheet name (default: all sections)
        #[arg(short, long, default_value = "all")]
        section: String,

        /// Layout file replacing the built-in layouts
        #[arg(short, long, env = "HOTSHEET_LAYOUTS")]
        config: Option<PathBuf>,

        /// Directory for run logs
        #[arg(long, default_value = "logs", env = "HOTSHEET_LOG_DIR")]
        log_dir: PathBuf,

        /// Copy the hotsheet to <product>_hotsheet_<date>.xlsx and update the copy
        #[arg(short = 'w', long)]
        working_copy: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,

        /// Do not draw progress bars
        #[arg(long)]
        no_progress: bool,

        /// Also print run log events to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Make a dated working copy of a hotsheet
    Copy {
        /// Product line, used in the copy's file name
        #[arg(short, long)]
        product: String,

        /// Hotsheet to copy
        #[arg(long)]
        hotsheet: PathBuf,
    },

    #[command(long_about = "List products, sections and the reconcilers each section runs.

With --config, the file is loaded and validated first, so this doubles as a
layout checker.

EXAMPLES:
  hotsheet layouts
  hotsheet layouts --product BSC
  hotsheet layouts --config my-layouts.yaml")]
    /// List products, sections and column maps
    Layouts {
        /// Layout file to validate and list
        #[arg(short, long, env = "HOTSHEET_LAYOUTS")]
        config: Option<PathBuf>,

        /// Show only this product, with its column letters
        #[arg(short, long)]
        product: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Reconcile {
            product,
            hotsheet,
            inventory,
            po,
            bn,
            stock,
            sales,
            section,
            config,
            log_dir,
            working_copy,
            json,
            no_progress,
            verbose,
        } => {
            hotsheet_sync::logging::init_console(verbose);
            cli::reconcile(cli::ReconcileArgs {
                product,
                hotsheet,
                inventory,
                po,
                bn,
                stock,
                sales,
                section,
                config,
                log_dir,
                working_copy,
                json,
                progress: !no_progress && !json,
                verbose,
            })?;
        }

        Commands::Copy { product, hotsheet } => {
            cli::copy(product, hotsheet)?;
        }

        Commands::Layouts { config, product } => {
            cli::layouts(config, product)?;
        }
    }
    Ok(())
}
