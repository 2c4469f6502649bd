mod paths;
mod view;

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

use datagrid_lib::Grid;
use datagrid_lib::GridApi;
use datagrid_lib::export::CsvOptions;

use view::GridView;

#[derive(Parser)]
#[command(name = "datagrid")]
#[command(about = "Run a grid view over JSON rows")]
struct Cli {
    /// Log at debug level instead of info
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rows a view shows as CSV or TSV
    Export {
        /// JSON array of row objects
        rows: PathBuf,

        /// Grid view JSON (defaults to view.json in the config directory)
        #[arg(long)]
        view: Option<PathBuf>,

        /// Tab-separated output
        #[arg(long)]
        tsv: bool,

        /// Only the current page instead of every page
        #[arg(long)]
        current_page: bool,

        /// Only selected rows
        #[arg(long)]
        selected: bool,

        #[arg(long)]
        no_header: bool,

        /// Export these fields, in this order
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print row counts, pagination and the column layout of a view
    Inspect {
        rows: PathBuf,

        #[arg(long)]
        view: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    paths::rotate_logs();
    let Some(path) = paths::log_file() else { return };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    match File::create(&path) {
        Ok(file) => {
            if WriteLogger::init(level, Config::default(), file).is_err() {
                eprintln!("Warning: logger already initialized");
            }
        }
        Err(e) => eprintln!("Warning: cannot create log file {}: {}", path.display(), e),
    }
}

fn load_grid(rows: &Path, view_path: Option<PathBuf>) -> Result<Grid> {
    let rows = view::load_rows(rows)?;
    let view = match view_path.or_else(paths::default_view) {
        Some(path) => {
            log::info!("using view {}", path.display());
            GridView::load(&path)?
        }
        None => GridView::default(),
    };
    Ok(view.build(rows))
}

fn inspect(grid: &Grid) -> String {
    let pagination = grid.get_pagination();
    let mut lines = vec![
        format!("rows: {}", grid.get_row_data().len()),
        format!("after filter: {}", pagination.total_rows),
        format!(
            "page: {}/{} ({} displayed)",
            pagination.current_page + 1,
            pagination.total_pages,
            grid.get_displayed_rows().len()
        ),
        format!("selected: {}", grid.get_selected_ids().len()),
        "columns:".to_string(),
    ];
    for column in grid.get_columns() {
        lines.push(format!(
            "  {:<20} left {:>7.1}  width {:>6.1}",
            column.def.display_name(),
            column.left,
            column.computed_width
        ));
    }
    lines.join("\n")
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export {
            rows,
            view,
            tsv,
            current_page,
            selected,
            no_header,
            columns,
            output,
        } => {
            let grid = load_grid(&rows, view)?;
            let mut options = CsvOptions::default();
            if tsv {
                options = options.separator('\t');
            }
            if current_page {
                options = options.current_page();
            }
            if selected {
                options = options.only_selected();
            }
            if no_header {
                options = options.skip_header();
            }
            if !columns.is_empty() {
                options = options.columns(columns);
            }

            let text = grid.export_to_csv(&options);
            match output {
                Some(path) => {
                    fs::write(&path, format!("{}\n", text))
                        .with_context(|| format!("writing {}", path.display()))?;
                    log::info!("exported {} line(s) to {}", text.lines().count(), path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    writeln!(stdout, "{}", text)?;
                }
            }
        }
        Commands::Inspect { rows, view } => {
            let grid = load_grid(&rows, view)?;
            println!("{}", inspect(&grid));
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
