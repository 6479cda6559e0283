//! Service module that exports interfaces to external applications, APIs, etc.

pub mod node_sync;
pub mod visualization;

// rexport some traits and utilty functions
pub use node_sync::{new_node_sync_handler, push_nodes, NodeSyncService};
pub use visualization::route::{new_route_visualization_handler, RouteMapRenderer};
