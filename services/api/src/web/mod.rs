pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod router;
pub mod state;
pub mod ws_handler;

// Re-export the entry points the binary needs to build the web server.
pub use router::build_router;
pub use ws_handler::ws_handler;
