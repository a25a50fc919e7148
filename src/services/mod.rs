pub mod report_writer;
pub mod reshaper;
