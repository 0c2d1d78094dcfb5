//! In-process storage API for HTTP tests
//!
//! Serves the four endpoints the client uses. Uploaded workbooks are parsed
//! with calamine; the first row of each sheet is the header.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::net::TcpListener as StdTcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use serde_json::{json, Map, Value};

type Sheets = Vec<(String, Vec<Map<String, Value>>)>;

#[derive(Default)]
struct Store {
    order: Vec<String>,
    files: HashMap<String, Sheets>,
}

type SharedStore = Arc<Mutex<Store>>;

/// A running mock API. The server lives until the test process exits.
pub struct MockBackend {
    pub base_url: String,
    store: SharedStore,
}

impl MockBackend {
    pub fn start() -> Self {
        let store = SharedStore::default();
        let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind mock API");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let addr = listener.local_addr().expect("local addr");
        let app = router(Arc::clone(&store));

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app).await.expect("mock API server");
            });
        });

        Self {
            base_url: format!("http://{}", addr),
            store,
        }
    }

    /// Put a file straight into the store, bypassing upload.
    pub fn seed(&self, file: &str, sheets: Vec<(&str, Value)>) {
        let parsed: Sheets = sheets
            .into_iter()
            .map(|(name, rows)| {
                let rows = serde_json::from_value(rows).expect("rows are objects");
                (name.to_string(), rows)
            })
            .collect();
        insert_file(&self.store, file, parsed);
    }
}

/// A port nothing listens on.
pub fn dead_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// The rainfall sheet used across tests: `hari1` is blank in the first row
/// only, `catatan` is blank everywhere.
pub fn rainfall_rows() -> Value {
    json!([
        {"no_das": 1, "nama_das": "Ciliwung", "luas_das": 10.5, "hari1": null, "catatan": ""},
        {"no_das": 2, "nama_das": "Cisadane", "luas_das": 20, "hari1": 5, "catatan": null}
    ])
}

/// Write a one-sheet workbook with a header row and the given rows.
pub fn write_workbook(path: &Path, sheet: &str, header: &[&str], rows: &[Vec<Value>]) {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    for (col, name) in header.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let (r, c) = ((r + 1) as u32, c as u16);
            match value {
                Value::Number(n) => {
                    worksheet.write_number(r, c, n.as_f64().unwrap()).unwrap();
                }
                Value::String(s) => {
                    worksheet.write_string(r, c, s).unwrap();
                }
                _ => {}
            }
        }
    }
    workbook.save(path).unwrap();
}

/// Read every sheet of an xlsx file back as rows of JSON values.
pub fn read_workbook(path: &Path) -> Vec<(String, Vec<Vec<Value>>)> {
    let bytes = std::fs::read(path).unwrap();
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    workbook
        .sheet_names()
        .into_iter()
        .map(|name| {
            let range = workbook.worksheet_range(&name).unwrap();
            let rows = range
                .rows()
                .map(|row| row.iter().map(cell_value).collect())
                .collect();
            (name, rows)
        })
        .collect()
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => json!(i),
        Data::Float(f) => json!(f),
        Data::String(s) => json!(s),
        Data::Bool(b) => json!(b),
        other => json!(other.to_string()),
    }
}

fn parse_upload(bytes: Vec<u8>) -> Option<Sheets> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).ok()?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name).ok()?;
        let mut rows = range.rows();
        let header: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(|c| c.to_string()).collect(),
            None => Vec::new(),
        };
        let records = rows
            .map(|row| {
                header
                    .iter()
                    .zip(row.iter())
                    .map(|(key, cell)| (key.clone(), cell_value(cell)))
                    .collect::<Map<String, Value>>()
            })
            .collect();
        sheets.push((name, records));
    }
    Some(sheets)
}

fn insert_file(store: &SharedStore, name: &str, sheets: Sheets) {
    let mut store = store.lock().unwrap();
    if !store.files.contains_key(name) {
        store.order.push(name.to_string());
    }
    store.files.insert(name.to_string(), sheets);
}

fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/api/files", get(list_files))
        .route("/api/upload", post(upload))
        .route("/api/sheets/:file", get(list_sheets))
        .route("/api/data/:file/:sheet", get(get_rows))
        .with_state(store)
}

async fn list_files(State(store): State<SharedStore>) -> Json<Vec<String>> {
    Json(store.lock().unwrap().order.clone())
}

async fn upload(State(store): State<SharedStore>, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.xlsx").to_string();
        let Ok(bytes) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        let Some(sheets) = parse_upload(bytes.to_vec()) else {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "not a workbook"})))
                .into_response();
        };
        insert_file(&store, &name, sheets);
        return Json(json!({"message": "uploaded", "file": name})).into_response();
    }
    StatusCode::BAD_REQUEST.into_response()
}

async fn list_sheets(State(store): State<SharedStore>, UrlPath(file): UrlPath<String>) -> Response {
    if file == "broken.xlsx" {
        return "<html>oops</html>".into_response();
    }
    let store = store.lock().unwrap();
    match store.files.get(&file) {
        Some(sheets) => {
            let names: Vec<String> = sheets.iter().map(|(name, _)| name.clone()).collect();
            Json(names).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_rows(
    State(store): State<SharedStore>,
    UrlPath((file, sheet)): UrlPath<(String, String)>,
) -> Response {
    let store = store.lock().unwrap();
    let rows = store
        .files
        .get(&file)
        .and_then(|sheets| sheets.iter().find(|(name, _)| name == &sheet))
        .map(|(_, rows)| rows.clone());
    match rows {
        Some(rows) => Json(rows).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
