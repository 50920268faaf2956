//! Series ingestion, calendar alignment, fill policy and merging

pub mod align;
pub mod fill;
pub mod merge;
pub mod provider;

pub use align::{align_series, AlignedFrame, AlignmentFlag, Column, DailyCalendar, Frame, SeriesAligner};
pub use fill::{ColumnClass, ColumnClassifier, FillPolicyResolver, FillReport};
pub use merge::{DatasetMerger, FeatureTable, DATE_KEY};
pub use provider::{FetchError, InMemorySource, SeriesSource};
