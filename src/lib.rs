pub mod device;
pub mod poll;
pub mod report;
