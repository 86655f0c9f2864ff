use thiserror::Error;
use tokio::sync::mpsc;

use crate::process::CellReport;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Record is missing the integer id field `{field}`.")]
    MissingId { field: String },

    #[error(
        "Cell {cell} is still capped after scanning up to width {max_width}. \
         Raise the max width or allow partial results for it."
    )]
    CapacityExhausted { cell: String, max_width: usize },
    #[error(
        "Cell {cell} returned {count} records (at or above the cap) but brute force is disabled for it."
    )]
    BruteForceDisabled { cell: String, count: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Malformed cookie pair: {0}")]
    Cookie(String),

    #[error("{} cell(s) failed: {}", .0.len(), .0.join("; "))]
    CellsFailed(Vec<String>),
    #[error("Run was stopped before all cells were processed.")]
    Aborted,

    #[error("Request to {url} failed with status {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
    #[error("Couldn't send a cell report through a channel.")]
    RuntimeSendError,

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<mpsc::error::SendError<CellReport>> for Error {
    fn from(_value: mpsc::error::SendError<CellReport>) -> Self {
        Error::RuntimeSendError
    }
}
