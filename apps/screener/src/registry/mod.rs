//! File Registry: owns the resume file records of one screening session.
//!
//! Records live in an id-indexed map with a separate insertion order, so
//! every mutation is a per-id update rather than a whole-list rewrite.
//!
//! Each upload attempt is issued a generation token. A deferred write-back
//! only lands if the record still exists and its token is unchanged; a
//! write-back for a removed or re-queued record is dropped.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod handlers;

pub type FileId = Uuid;

/// The raw file a user selected.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Uploading,
    Uploaded,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub id: FileId,
    #[serde(skip)]
    pub file: ResumeFile,
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    pub status: FileStatus,
    pub resume_id: Option<String>,
    pub candidate_name: Option<String>,
    pub candidate_info: Option<Value>,
    pub error_message: Option<String>,
    /// Non-fatal problem reported by the service (e.g. text extraction failed).
    pub warning: Option<String>,
    #[serde(skip)]
    generation: u64,
    pub added_at: DateTime<Utc>,
}

impl FileRecord {
    fn new(id: FileId, file: ResumeFile) -> Self {
        Self {
            id,
            name: file.name.clone(),
            size: file.bytes.len() as u64,
            file,
            status: FileStatus::Pending,
            resume_id: None,
            candidate_name: None,
            candidate_info: None,
            error_message: None,
            warning: None,
            generation: 0,
            added_at: Utc::now(),
        }
    }

    /// Size in kilobytes with two decimals, as shown next to the file name.
    pub fn size_kb(&self) -> String {
        format!("{:.2}", self.size as f64 / 1024.0)
    }
}

/// Everything an upload task needs, detached from the registry lock.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    pub id: FileId,
    pub generation: u64,
    pub file: ResumeFile,
}

/// Result of one upload attempt, applied back onto its record.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    Uploaded {
        resume_id: String,
        candidate_name: Option<String>,
        candidate_info: Option<Value>,
        warning: Option<String>,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBack {
    Applied,
    /// The record was removed while the request was in flight.
    Removed,
    /// The record was re-queued and a newer attempt owns it.
    Stale,
}

/// Snapshot of an uploaded record, the only input screening needs.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: FileId,
    pub resume_id: String,
    pub name: String,
    pub candidate_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct FileRegistry {
    records: HashMap<FileId, FileRecord>,
    order: Vec<FileId>,
    next_generation: u64,
}

impl FileRegistry {
    /// Appends one pending record per selected file and returns the new ids.
    pub fn add_files(&mut self, selection: Vec<ResumeFile>) -> Vec<FileId> {
        let mut added = Vec::with_capacity(selection.len());
        for file in selection {
            let mut id = Uuid::new_v4();
            while self.records.contains_key(&id) {
                id = Uuid::new_v4();
            }
            debug!("Registered {} as {id}", file.name);
            self.records.insert(id, FileRecord::new(id, file));
            self.order.push(id);
            added.push(id);
        }
        added
    }

    /// Removes a record at any point in its lifecycle.
    pub fn remove_file(&mut self, id: FileId) -> Option<FileRecord> {
        let removed = self.records.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(removed)
    }

    #[cfg(test)]
    pub fn get(&self, id: FileId) -> Option<&FileRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Records in selection order.
    pub fn records(&self) -> Vec<&FileRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Ids that an upload batch should pick up: not uploaded, not errored,
    /// not already in flight.
    pub fn uploadable(&self) -> Vec<FileId> {
        self.records()
            .into_iter()
            .filter(|r| r.status == FileStatus::Pending)
            .map(|r| r.id)
            .collect()
    }

    /// Uploaded records in selection order.
    pub fn uploaded(&self) -> Vec<UploadedFile> {
        self.records()
            .into_iter()
            .filter(|r| r.status == FileStatus::Uploaded)
            .filter_map(|r| {
                Some(UploadedFile {
                    id: r.id,
                    resume_id: r.resume_id.clone()?,
                    name: r.name.clone(),
                    candidate_name: r.candidate_name.clone(),
                })
            })
            .collect()
    }

    /// Moves a pending record to `uploading` and hands out a fresh ticket.
    pub fn begin_upload(&mut self, id: FileId) -> Option<UploadTicket> {
        self.next_generation += 1;
        let generation = self.next_generation;

        let record = self.records.get_mut(&id)?;
        if record.status != FileStatus::Pending {
            return None;
        }
        record.status = FileStatus::Uploading;
        record.generation = generation;
        record.error_message = None;

        Some(UploadTicket {
            id,
            generation,
            file: record.file.clone(),
        })
    }

    /// Applies a finished upload attempt if its ticket is still current.
    pub fn apply(&mut self, id: FileId, generation: u64, outcome: UploadOutcome) -> WriteBack {
        let Some(record) = self.records.get_mut(&id) else {
            warn!("Dropping upload result for removed file {id}");
            return WriteBack::Removed;
        };
        if record.generation != generation || record.status != FileStatus::Uploading {
            warn!("Dropping stale upload result for {}", record.name);
            return WriteBack::Stale;
        }

        match outcome {
            UploadOutcome::Uploaded {
                resume_id,
                candidate_name,
                candidate_info,
                warning,
            } => {
                record.status = FileStatus::Uploaded;
                record.resume_id = Some(resume_id);
                record.candidate_name = candidate_name;
                record.candidate_info = candidate_info;
                record.warning = warning;
                record.error_message = None;
            }
            UploadOutcome::Failed { message } => {
                record.status = FileStatus::Error;
                record.resume_id = None;
                record.error_message = Some(message);
            }
        }
        WriteBack::Applied
    }

    /// Re-queues every errored record. Recovery is always user-initiated.
    pub fn reset_errored(&mut self) -> usize {
        let mut reset = 0;
        for id in &self.order {
            if let Some(record) = self.records.get_mut(id) {
                if record.status == FileStatus::Error {
                    record.status = FileStatus::Pending;
                    record.error_message = None;
                    reset += 1;
                }
            }
        }
        reset
    }
}
