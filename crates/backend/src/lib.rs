pub mod api;
pub mod dashboards;
pub mod routes;
pub mod shared;
pub mod state;
pub mod system;
