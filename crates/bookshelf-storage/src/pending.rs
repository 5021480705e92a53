use crate::request::{Operation, PickerRequest, Ticket};
use std::collections::HashMap;
use std::path::PathBuf;

/// What to do once storage permission has been granted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterGrant {
    /// Remember `target` as the backup folder, then optionally run the operation
    Persist { target: PathBuf, act: bool },
    /// Open the in-app directory browser
    OpenAppPicker { act: bool },
}

/// The work left to do when a ticketed prompt is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    FolderMenu { operation: Operation, act: bool },
    StoragePermission { operation: Operation, then: AfterGrant },
    AppPicker { operation: Operation, act: bool },
    RemoteDialog,
}

impl Continuation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FolderMenu { .. } => "folder menu",
            Self::StoragePermission { .. } => "storage permission",
            Self::AppPicker { .. } => "app picker",
            Self::RemoteDialog => "remote restore dialog",
        }
    }
}

/// Outstanding prompts waiting for the platform to answer.
///
/// Each record is consumed at most once. Prompts the user abandons stay
/// here until the process ends; there is no timeout.
#[derive(Debug, Default)]
pub struct PendingRequests {
    next_ticket: u64,
    tickets: HashMap<Ticket, Continuation>,
    pickers: HashMap<PickerRequest, usize>,
    last_picked: Option<(PickerRequest, String)>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a continuation and return the ticket its answer must carry
    pub fn issue(&mut self, continuation: Continuation) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.tickets.insert(ticket, continuation);
        ticket
    }

    /// Remove and return the continuation for `ticket`
    pub fn take(&mut self, ticket: Ticket) -> Option<Continuation> {
        self.tickets.remove(&ticket)
    }

    /// Put back a continuation taken by mistake, under its original ticket
    pub fn restore(&mut self, ticket: Ticket, continuation: Continuation) {
        self.tickets.insert(ticket, continuation);
    }

    pub fn peek(&self, ticket: Ticket) -> Option<&Continuation> {
        self.tickets.get(&ticket)
    }

    /// Record that a system picker was launched with `request`
    pub fn launch_picker(&mut self, request: PickerRequest) {
        *self.pickers.entry(request).or_default() += 1;
    }

    /// Consume one outstanding launch of `request`.
    ///
    /// Returns `false` when no such launch is outstanding.
    pub fn take_picker(&mut self, request: PickerRequest) -> bool {
        match self.pickers.get_mut(&request) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.pickers.remove(&request);
                true
            }
            None => false,
        }
    }

    /// Remember the folder last accepted from a picker result
    pub fn record_picked(&mut self, request: PickerRequest, uri: &str) {
        self.last_picked = Some((request, uri.to_string()));
    }

    /// Whether a result with no outstanding launch repeats the one accepted last.
    ///
    /// Only results seen by this table are known; a result delivered to a
    /// freshly created flow is never a repeat.
    pub fn repeats_last_pick(&self, request: PickerRequest, uri: Option<&str>) -> bool {
        match (&self.last_picked, uri) {
            (Some((last_request, last_uri)), Some(uri)) => {
                *last_request == request && last_uri == uri
            }
            _ => false,
        }
    }

    pub fn has_picker(&self, request: PickerRequest) -> bool {
        self.pickers.contains_key(&request)
    }

    pub fn len(&self) -> usize {
        self.tickets.len() + self.pickers.values().sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
