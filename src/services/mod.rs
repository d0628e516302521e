pub mod generation;
pub mod summarize;
