pub mod jobs;
pub mod serve;
pub mod version;
