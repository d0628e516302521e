pub mod db;
pub mod summaries;
