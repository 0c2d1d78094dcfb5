//! Event-driven session
//!
//! A `Session` owns a [`Viewer`] and a [`DataService`]. User actions update
//! the viewer immediately and spawn the matching request on the tokio
//! runtime; results come back as [`Event`]s over a channel and are applied in
//! arrival order. Responses for superseded selections are dropped by the
//! viewer's tickets.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::client::{DataService, UploadFile};
use crate::error::ViewerResult;
use crate::export::{ExportColumns, ExportedWorkbook};
use crate::types::Dataset;
use crate::viewer::{DataTicket, Operation, SheetsTicket, Viewer};

/// A settled request.
#[derive(Debug)]
pub enum Event {
    Files(ViewerResult<Vec<String>>),
    Uploaded {
        name: String,
        result: ViewerResult<Value>,
    },
    Sheets(SheetsTicket, ViewerResult<Vec<String>>),
    Rows(DataTicket, ViewerResult<Dataset>),
}

pub struct Session {
    service: Arc<dyn DataService>,
    viewer: Viewer,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    in_flight: usize,
}

impl Session {
    /// Must be created and driven inside a tokio runtime.
    pub fn new(service: Arc<dyn DataService>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service,
            viewer: Viewer::new(),
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Requests dispatched but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn refresh_files(&mut self) {
        let service = Arc::clone(&self.service);
        self.spawn(async move { Event::Files(service.list_files().await) });
    }

    /// Upload a file. The viewer reports uploading until the request settles;
    /// the file list is refreshed afterwards whatever the outcome.
    pub fn upload(&mut self, file: UploadFile) {
        let service = Arc::clone(&self.service);
        let guard = self.viewer.upload_indicator().begin();
        self.spawn(async move {
            let name = file.name.clone();
            let result = service.upload(file).await;
            drop(guard);
            Event::Uploaded { name, result }
        });
    }

    pub fn select_file(&mut self, file: &str) {
        if let Some(ticket) = self.viewer.select_file(file) {
            self.fetch_sheets(ticket);
        }
    }

    pub fn select_sheet(&mut self, sheet: &str) {
        if let Some(ticket) = self.viewer.select_sheet(sheet) {
            self.fetch_rows(ticket);
        }
    }

    /// Re-issue the last failed request. Uploads are not repeated since the
    /// file contents are gone; the file list is refreshed instead.
    pub fn retry(&mut self) -> Option<Operation> {
        let operation = self.viewer.take_retry()?;
        match &operation {
            Operation::ListFiles | Operation::Upload { .. } => self.refresh_files(),
            Operation::ListSheets { file } => match self.viewer.sheets_ticket() {
                Some(ticket) if &ticket.file == file => self.fetch_sheets(ticket),
                _ => warn!(file = %file, "selection changed, nothing to retry"),
            },
            Operation::LoadData { file, sheet } => match self.viewer.data_ticket() {
                Some(ticket) if &ticket.file == file && &ticket.sheet == sheet => {
                    self.fetch_rows(ticket)
                }
                _ => warn!(file = %file, sheet = %sheet, "selection changed, nothing to retry"),
            },
        }
        Some(operation)
    }

    /// Encode what is currently loaded. `None` when no rows are loaded.
    pub fn download(&self, columns: ExportColumns) -> ViewerResult<Option<ExportedWorkbook>> {
        self.viewer.export(columns)
    }

    /// Wait for the next settled request. `None` when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<Event> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.rx.recv().await;
        if event.is_some() {
            self.in_flight -= 1;
        }
        event
    }

    /// Apply a settled request. Returns false if it belonged to a superseded
    /// selection and was dropped.
    pub fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Files(result) => {
                self.viewer.apply_files(result);
                true
            }
            Event::Uploaded { name, result } => {
                self.viewer.apply_upload(&name, result);
                self.refresh_files();
                true
            }
            Event::Sheets(ticket, result) => self.viewer.apply_sheets(&ticket, result),
            Event::Rows(ticket, result) => self.viewer.apply_rows(&ticket, result),
        }
    }

    /// Apply events until nothing is in flight, including follow-up requests
    /// such as the refresh after an upload.
    pub async fn settle(&mut self) {
        while let Some(event) = self.next_event().await {
            self.handle(event);
        }
    }

    fn fetch_sheets(&mut self, ticket: SheetsTicket) {
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.list_sheets(&ticket.file).await;
            Event::Sheets(ticket, result)
        });
    }

    fn fetch_rows(&mut self, ticket: DataTicket) {
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.fetch_rows(&ticket.file, &ticket.sheet).await;
            Event::Rows(ticket, result)
        });
    }

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = request.await;
            if tx.send(event).is_err() {
                debug!("session closed before request settled");
            }
        });
    }
}
