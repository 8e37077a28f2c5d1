pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;

pub use routes::create_router;
pub use state::AppState;
pub use store::PreferenceStore;
