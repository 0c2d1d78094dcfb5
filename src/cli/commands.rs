use crate::client::{DataService, UploadFile};
use crate::error::ViewerResult;
use crate::export::{ExportColumns, SheetExporter};
use crate::table::{header_label, visible_columns, TableView};
use crate::types::Dataset;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Print a list of names, one per line, or a note when it is empty.
pub(crate) fn print_list(title: &str, items: &[String], empty: &str) {
    println!("{}", title.bold().green());
    if items.is_empty() {
        println!("   {}", empty.yellow());
        return;
    }
    for (idx, item) in items.iter().enumerate() {
        println!("   {:>3}. {}", idx + 1, item.bright_blue());
    }
}

/// Print the filtered table, or a note when there are no rows.
pub(crate) fn print_table(data: &Dataset) {
    match TableView::build(data) {
        Some(view) => {
            view.print();
            println!();
            println!(
                "   {} rows, {} of {} columns shown",
                data.len(),
                view.columns.len(),
                data.first_row_columns().len()
            );
        }
        None => println!("   {}", "No rows in this sheet".yellow()),
    }
}

/// Execute the files command
pub async fn files(service: &dyn DataService) -> ViewerResult<()> {
    let files = service.list_files().await?;
    print_list("📂 Files", &files, "No files uploaded yet");
    Ok(())
}

/// Execute the upload command
///
/// The file list is printed after the upload whether or not it succeeded;
/// the upload error, if any, is returned afterwards.
pub async fn upload(service: &dyn DataService, path: &Path) -> ViewerResult<()> {
    let file = UploadFile::from_path(path)?;
    println!("{}", "📤 Uploading file".bold().green());
    println!("   File: {}", path.display());
    println!("   Size: {} bytes", file.bytes.len());

    println!("   {}", "⏳ Uploading...".blue());
    let result = service.upload(file).await;

    match &result {
        Ok(_) => println!("{}", "✅ Upload complete".bold().green()),
        Err(e) => println!("{} {}", "❌ Upload failed:".bold().red(), e),
    }
    println!();

    match service.list_files().await {
        Ok(files) => print_list("📂 Files", &files, "No files uploaded yet"),
        Err(e) => println!("{} {}", "⚠️  Could not refresh file list:".yellow(), e),
    }

    result.map(|_| ())
}

/// Execute the sheets command
pub async fn sheets(service: &dyn DataService, file: &str) -> ViewerResult<()> {
    let sheets = service.list_sheets(file).await?;
    print_list(&format!("📑 Sheets in {}", file), &sheets, "No sheets found");
    Ok(())
}

/// Execute the show command
pub async fn show(service: &dyn DataService, file: &str, sheet: &str) -> ViewerResult<()> {
    let data = service.fetch_rows(file, sheet).await?;
    println!("{}", format!("📊 {} / {}", file, sheet).bold().green());
    println!();
    print_table(&data);
    Ok(())
}

/// Execute the columns command - show which columns have content
pub async fn columns(service: &dyn DataService, file: &str, sheet: &str) -> ViewerResult<()> {
    let data = service.fetch_rows(file, sheet).await?;
    println!("{}", format!("🔎 Columns of {} / {}", file, sheet).bold().green());

    let visible = visible_columns(&data);
    for column in data.first_row_columns() {
        if visible.contains(&column) {
            println!(
                "   {} {} → {}",
                "✓".green(),
                column.cyan(),
                header_label(&column)
            );
        } else {
            println!("   {} {} {}", "·".dimmed(), column.dimmed(), "(empty)".dimmed());
        }
    }
    if data.is_empty() {
        println!("   {}", "No rows in this sheet".yellow());
    }
    Ok(())
}

/// Execute the export command
///
/// Writes nothing when the sheet has no rows.
pub async fn export(
    service: &dyn DataService,
    file: &str,
    sheet: &str,
    output: Option<PathBuf>,
    visible_only: bool,
) -> ViewerResult<()> {
    let data = service.fetch_rows(file, sheet).await?;
    let columns = if visible_only {
        ExportColumns::Visible
    } else {
        ExportColumns::All
    };

    let Some(workbook) = SheetExporter::new(&data, Some(sheet))
        .with_columns(columns)
        .export()?
    else {
        println!("{}", "⚠️  Nothing to export: the sheet has no rows".yellow());
        return Ok(());
    };

    let path = output.unwrap_or_else(|| PathBuf::from(&workbook.file_name));
    workbook.save(&path)?;

    println!("{}", "✅ Export complete".bold().green());
    println!("   Sheet: {}", workbook.sheet_name.bright_blue());
    println!("   Rows: {}", data.len());
    println!("   Saved to: {}", path.display());
    Ok(())
}
