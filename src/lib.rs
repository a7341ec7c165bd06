// Modules
pub mod data;
pub mod errors;
pub mod impurity;
pub mod membership;
pub mod split;
pub mod surrogate;
pub mod utils;

// Individual classes, and functions
pub use data::Matrix;
pub use impurity::{ImpurityMeasure, WeightedClassCounts};
pub use membership::{ColumnCursor, RowSubsetView};
pub use split::{ChildCondition, SplitCandidate, SplitRule};
pub use surrogate::{SurrogateFinder, SurrogateSplit};
