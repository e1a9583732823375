pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;
pub mod types;

pub use server::{build_router, serve};
pub use state::AppState;
pub use types::{ApiError, ApiResponse, ApiResult, error_codes};
