pub mod ingest;
pub mod migrate;
pub mod ping;
pub mod status;
pub mod web;

pub use ingest::handle_ingest;
pub use migrate::handle_migrate;
pub use ping::handle_ping;
pub use status::handle_status;
pub use web::handle_web;
