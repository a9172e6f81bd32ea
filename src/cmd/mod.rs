pub mod chart;
pub mod holidays;
pub mod init;
pub mod jobs;
pub mod releases;
