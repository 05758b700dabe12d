pub mod routes;

pub use routes::{create_admin_routes, AdminState};
