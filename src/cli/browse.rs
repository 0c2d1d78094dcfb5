//! Interactive browse session
//!
//! Reads commands from stdin while requests run in the background. Output
//! for a request is printed when its result arrives, so a slow sheet list for
//! a file the user has already moved away from is silently dropped.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::commands::{print_list, print_table};
use crate::client::{DataService, UploadFile};
use crate::error::ViewerResult;
use crate::export::ExportColumns;
use crate::session::{Event, Session};
use crate::viewer::Operation;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Files,
    Upload(PathBuf),
    /// Empty name deselects.
    File(String),
    /// Empty name deselects.
    Sheet(String),
    Show,
    Download {
        path: Option<PathBuf>,
        visible_only: bool,
    },
    Status,
    Retry,
    Help,
    Quit,
    Nothing,
}

/// Parse a line. Names may contain spaces: everything after the command word
/// is the argument.
pub fn parse_command(line: &str) -> Result<BrowseCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "" => BrowseCommand::Nothing,
        "files" | "ls" => BrowseCommand::Files,
        "upload" | "up" => {
            if rest.is_empty() {
                return Err("usage: upload <path>".to_string());
            }
            BrowseCommand::Upload(PathBuf::from(rest))
        }
        "file" | "f" => BrowseCommand::File(rest.to_string()),
        "sheet" | "s" => BrowseCommand::Sheet(rest.to_string()),
        "show" | "table" => BrowseCommand::Show,
        "download" | "export" | "dl" => {
            let (visible_only, path) = match rest.strip_prefix("--visible") {
                Some(after) if after.is_empty() || after.starts_with(char::is_whitespace) => {
                    (true, after.trim())
                }
                _ => (false, rest),
            };
            BrowseCommand::Download {
                path: Some(path).filter(|p| !p.is_empty()).map(PathBuf::from),
                visible_only,
            }
        }
        "status" => BrowseCommand::Status,
        "retry" => BrowseCommand::Retry,
        "help" | "?" => BrowseCommand::Help,
        "quit" | "exit" | "q" => BrowseCommand::Quit,
        other => return Err(format!("unknown command '{}', type 'help'", other)),
    };
    Ok(command)
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("   files                      list uploaded files");
    println!("   upload <path>              upload a spreadsheet");
    println!("   file <name>                select a file (no name to deselect)");
    println!("   sheet <name>               select a sheet of the file");
    println!("   show                       show the loaded table");
    println!("   download [--visible] [path]  save the loaded rows as .xlsx");
    println!("   status                     show the current selection");
    println!("   retry                      repeat the last failed request");
    println!("   quit                       leave");
}

fn print_status(session: &Session) {
    let viewer = session.viewer();
    println!("{}", "📋 Status".bold().green());
    println!("   Stage: {}", viewer.stage());
    println!("   File: {}", viewer.selected_file().unwrap_or("-"));
    println!("   Sheet: {}", viewer.selected_sheet().unwrap_or("-"));
    println!("   Rows: {}", viewer.data().len());
    if viewer.is_uploading() {
        println!("   {}", "⏳ Uploading...".blue());
    }
    if session.in_flight() > 0 {
        println!("   Pending requests: {}", session.in_flight());
    }
    if let Some(failed) = viewer.last_error() {
        println!(
            "   {} {} ({})",
            "Last error:".red(),
            failed.message,
            failed.operation
        );
    }
}

fn run_command(session: &mut Session, command: BrowseCommand) -> ViewerResult<()> {
    match command {
        BrowseCommand::Nothing | BrowseCommand::Quit => {}
        BrowseCommand::Help => print_help(),
        BrowseCommand::Status => print_status(session),
        BrowseCommand::Files => {
            print_list("📂 Files", session.viewer().files(), "No files uploaded yet");
            session.refresh_files();
        }
        BrowseCommand::Upload(path) => match UploadFile::from_path(&path) {
            Ok(file) => {
                session.upload(file);
                println!("   {}", "⏳ Uploading...".blue());
            }
            Err(e) => println!("{} {}", "❌".red(), e),
        },
        BrowseCommand::File(name) => {
            if !name.is_empty() && !session.viewer().files().contains(&name) {
                println!("   {}", format!("'{}' is not in the file list", name).yellow());
            }
            session.select_file(&name);
        }
        BrowseCommand::Sheet(name) => {
            if session.viewer().selected_file().is_none() {
                println!("   {}", "Select a file first".yellow());
                return Ok(());
            }
            session.select_sheet(&name);
        }
        BrowseCommand::Show => {
            if session.viewer().data().is_empty() {
                println!("   {}", "No data loaded".yellow());
            } else {
                print_table(session.viewer().data());
            }
        }
        BrowseCommand::Download { path, visible_only } => {
            let columns = if visible_only {
                ExportColumns::Visible
            } else {
                ExportColumns::All
            };
            // No download without rows.
            if let Some(workbook) = session.download(columns)? {
                let path = path.unwrap_or_else(|| PathBuf::from(&workbook.file_name));
                workbook.save(&path)?;
                println!(
                    "{} {}",
                    "⬇️  Saved".green(),
                    path.display().to_string().bright_blue()
                );
            } else {
                println!("   {}", "No data loaded".yellow());
            }
        }
        BrowseCommand::Retry => match session.retry() {
            Some(operation) => println!("   Retrying {}", operation),
            None => println!("   Nothing to retry"),
        },
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Settled {
    Files,
    Upload,
    Sheets,
    Rows,
}

impl Settled {
    fn failed(self, operation: &Operation) -> bool {
        matches!(
            (self, operation),
            (Settled::Files, Operation::ListFiles)
                | (Settled::Upload, Operation::Upload { .. })
                | (Settled::Sheets, Operation::ListSheets { .. })
                | (Settled::Rows, Operation::LoadData { .. })
        )
    }
}

fn report_event(session: &mut Session, event: Event) {
    let settled = match &event {
        Event::Files(_) => Settled::Files,
        Event::Uploaded { .. } => Settled::Upload,
        Event::Sheets(..) => Settled::Sheets,
        Event::Rows(..) => Settled::Rows,
    };
    if !session.handle(event) {
        return;
    }

    let viewer = session.viewer();
    if let Some(failed) = viewer.last_error().filter(|f| settled.failed(&f.operation)) {
        println!(
            "{} {} {}",
            "❌".red(),
            failed.message,
            "(type 'retry')".dimmed()
        );
        return;
    }
    match settled {
        Settled::Files => println!("   📂 {} files available", viewer.files().len()),
        Settled::Upload => println!("{}", "✅ Upload complete".green()),
        Settled::Sheets => print_list(
            &format!("📑 Sheets in {}", viewer.selected_file().unwrap_or("-")),
            viewer.sheets(),
            "No sheets found",
        ),
        Settled::Rows => println!(
            "   ✅ {} rows loaded, type 'show' or 'download'",
            viewer.data().len()
        ),
    }
}

/// Execute the browse command
pub async fn browse(service: Arc<dyn DataService>) -> ViewerResult<()> {
    println!("{}", "📊 Rainsheet - interactive session".bold().green());
    println!("   Type 'help' for commands.");
    println!();

    let mut session = Session::new(service);
    session.refresh_files();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(BrowseCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = run_command(&mut session, command) {
                            println!("{} {}", "❌".red(), e);
                        }
                    }
                    Err(message) => println!("   {}", message.yellow()),
                }
            }
            Some(event) = session.next_event(), if session.in_flight() > 0 => {
                report_event(&mut session, event);
            }
        }
    }

    // Let an upload that is still running finish before leaving.
    if session.viewer().is_uploading() {
        session.settle().await;
    }
    Ok(())
}
