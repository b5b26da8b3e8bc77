use thiserror::Error;

use crate::parse::ParseError;
use crate::service::ServiceError;
use crate::store::StoreError;
use crate::RejectedRules;

/// Unified error type covering parsing, validation, storage, and I/O.
///
/// Returned by convenience methods like [`SurveyLogic::from_dsl()`](crate::SurveyLogic::from_dsl)
/// and [`SurveyLogic::from_file()`](crate::SurveyLogic::from_file).
#[derive(Debug, Error)]
pub enum BranchwiseError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Rejected(#[from] RejectedRules),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),

    #[error("failed to load {}: {source}", .path.display())]
    SurveyFile {
        path: std::path::PathBuf,
        source: Box<BranchwiseError>,
    },
}
