use thiserror::Error;

/// Dataset-level failures. These abort a load and are reported to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("dataset is empty: no usable rows")]
    EmptyDataset,

    #[error("no record has a parseable date, last session cannot be identified")]
    NoValidData,
}

/// Per-row problems. The row is either dropped or kept without a date; the load continues.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum RecordError {
    #[error("row {row}: malformed {field}: {reason}")]
    MalformedRecord {
        row: usize,
        field: &'static str,
        reason: String,
    },

    #[error("row {row}: unparseable date {raw:?}")]
    UnparseableDate { row: usize, raw: String },
}

impl RecordError {
    pub fn row(&self) -> usize {
        match self {
            RecordError::MalformedRecord { row, .. } | RecordError::UnparseableDate { row, .. } => {
                *row
            }
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, RecordError::MalformedRecord { .. })
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("data source failed: {0:#}")]
    Source(anyhow::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
