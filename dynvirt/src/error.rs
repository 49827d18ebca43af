use core::fmt;

use crate::VisibleWindow;

/// Recoverable conditions reported by the engine.
///
/// None of these are fatal: the engine leaves its state untouched (or falls back to average
/// height estimates) and reports the condition so the adapter can log or ignore it.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A targeted request named an index outside `[0, len)`.
    OutOfRange { index: usize, len: usize },
    /// A targeted request named an index that is not currently materialized, so no rendered
    /// geometry can exist for it.
    NotMaterialized { index: usize, window: VisibleWindow },
    /// The host returned no geometry for a measurement request.
    MeasurementUnavailable,
    /// A measurement result arrived for a list generation that has since been replaced or
    /// refreshed.
    StaleMeasurement { generation: u64, current: u64 },
    /// A configuration value was rejected by validation.
    InvalidConfiguration {
        field: &'static str,
        reason: String,
    },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

impl Error {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} is out of range for a list of {len} items")
            }
            Self::NotMaterialized { index, window } => write!(
                f,
                "index {index} is not materialized (window is [{}, {}))",
                window.start_index, window.end_index
            ),
            Self::MeasurementUnavailable => f.write_str("no rendered geometry was available"),
            Self::StaleMeasurement {
                generation,
                current,
            } => write!(
                f,
                "measurement for list generation {generation} discarded (current is {current})"
            ),
            Self::InvalidConfiguration { field, reason } => {
                write!(f, "invalid `{field}`: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}
