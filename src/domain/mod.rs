pub mod dispatch;
pub mod errors;
pub mod line_item;
pub mod order;
pub mod ports;
pub mod report;
