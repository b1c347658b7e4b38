pub mod backend_client;
pub mod draft_repo;
pub mod endpoints;
pub mod models;
