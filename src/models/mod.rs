pub mod forest;

pub use forest::ForestClassifier;
