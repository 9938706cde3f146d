pub mod certificates;
pub mod content;
pub mod learning;
pub mod progress;
pub mod user;
