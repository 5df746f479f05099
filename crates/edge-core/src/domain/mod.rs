//! 도메인 모델.

pub mod job;
pub mod lenient;
pub mod merge;
pub mod record;
pub mod sections;
pub mod ticker;

pub use job::*;
pub use merge::{Blank, FillMissing, Metric};
pub use record::*;
pub use sections::*;
pub use ticker::*;
