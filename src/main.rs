use clap::{Parser, Subcommand};
use rainsheet::cli;
use rainsheet::client::HttpDataService;
use rainsheet::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use rainsheet::error::ViewerResult;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rainsheet")]
#[command(about = "Upload, browse, and re-export spreadsheets from a sheet storage API.")]
#[command(long_about = "Rainsheet - spreadsheet browser for a sheet storage API

The API parses uploaded workbooks and serves each sheet as JSON rows.
Rainsheet lists files, shows a sheet as a table (empty columns hidden),
and saves the rows back out as .xlsx.

COMMANDS:
  files     - List uploaded files
  upload    - Upload a spreadsheet
  sheets    - List the sheets of a file
  show      - Show a sheet as a table
  columns   - Show which columns carry data
  export    - Save a sheet as .xlsx
  browse    - Interactive session

EXAMPLES:
  rainsheet files
  rainsheet upload hujan.xlsx
  rainsheet show hujan.xlsx Januari
  rainsheet export hujan.xlsx Januari -o januari.xlsx --visible-only
  rainsheet --api http://10.0.0.5:5000 browse")]
#[command(version)]
struct Cli {
    /// Base URL of the storage API
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL, env = "RAINSHEET_API")]
    api: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS, env = "RAINSHEET_TIMEOUT")]
    timeout: u64,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List uploaded files
    Files,

    #[command(long_about = "Upload a spreadsheet to the storage API.

The file is sent as-is; the API decides whether it can parse it.
The file list is shown afterwards, even if the upload failed.

EXAMPLE:
  rainsheet upload data/curah_hujan_2024.xlsx")]
    /// Upload a spreadsheet
    Upload {
        /// Path to the file to upload
        path: PathBuf,
    },

    /// List the sheets of a file
    Sheets {
        /// File name as listed by 'files'
        file: String,
    },

    #[command(long_about = "Show a sheet as a table.

Columns that are empty in every row are hidden. The first column is
a row number. Known column names get friendly headers:
  no_das → No DAS, nama_das → Wilayah, luas_das → Luas DAS, hari1 → Hari 1")]
    /// Show a sheet as a table
    Show {
        /// File name as listed by 'files'
        file: String,

        /// Sheet name as listed by 'sheets'
        sheet: String,
    },

    /// Show which columns of a sheet carry data
    Columns {
        /// File name as listed by 'files'
        file: String,

        /// Sheet name as listed by 'sheets'
        sheet: String,
    },

    #[command(long_about = "Save a sheet's rows as an .xlsx workbook.

The workbook has one worksheet named after the sheet. By default every
column is written, including ones 'show' hides; use --visible-only to
write just the columns that carry data.

EXAMPLE:
  rainsheet export hujan.xlsx Januari              # writes Januari.xlsx
  rainsheet export hujan.xlsx Januari -o out.xlsx --visible-only")]
    /// Save a sheet as .xlsx
    Export {
        /// File name as listed by 'files'
        file: String,

        /// Sheet name as listed by 'sheets'
        sheet: String,

        /// Output path (default: <sheet>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only write columns that carry data
        #[arg(long)]
        visible_only: bool,
    },

    #[command(long_about = "Interactive session.

Pick a file, then a sheet; rows load in the background. Type 'help'
inside the session for the command list.")]
    /// Interactive session
    Browse,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    rainsheet::logging::init(cli.verbose);

    let config = ClientConfig::new(&cli.api, Duration::from_secs(cli.timeout))?;
    run(cli.command, HttpDataService::new(config)).await?;
    Ok(())
}

async fn run(command: Commands, service: HttpDataService) -> ViewerResult<()> {
    match command {
        Commands::Files => cli::files(&service).await,
        Commands::Upload { path } => cli::upload(&service, &path).await,
        Commands::Sheets { file } => cli::sheets(&service, &file).await,
        Commands::Show { file, sheet } => cli::show(&service, &file, &sheet).await,
        Commands::Columns { file, sheet } => cli::columns(&service, &file, &sheet).await,
        Commands::Export {
            file,
            sheet,
            output,
            visible_only,
        } => cli::export(&service, &file, &sheet, output, visible_only).await,
        Commands::Browse => cli::browse(Arc::new(service)).await,
    }
}
