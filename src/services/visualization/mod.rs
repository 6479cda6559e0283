//! Visualize routes and markers for the user
pub mod route;
