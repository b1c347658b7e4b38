pub mod order_service;
pub mod report_service;

#[cfg(test)]
pub(crate) mod testing;
