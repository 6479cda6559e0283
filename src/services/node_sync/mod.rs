//! Push marker nodes into an external map editor
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::nodes::OsmNode;
use crate::Error;
use log::{error, info, trace};
use std::thread;
use std::time::Duration;

mod josm;
pub use josm::Josm;

/// A fallible sink that accepts one node per request
pub trait NodeSyncService {
    /// Ask the editor to create a node, `Ok` means the editor accepted it
    fn add_node(&self, node: &OsmNode) -> Result<(), Box<dyn std::error::Error>>;

    /// Pause inserted between consecutive requests
    fn request_delay(&self) -> Option<Duration> {
        None
    }
}

/// Create a node sync service from its configuration entry
pub fn new_node_sync_handler(config: &ServiceConfig) -> Result<Box<dyn NodeSyncService>, Error> {
    match config.handler() {
        "josm" => Ok(Box::new(Josm::from_config(config)?)),
        _ => Err(Error::UnknownServiceHandler(format!(
            "unknown node_sync handler: {}",
            config.handler()
        ))),
    }
}

/// Send nodes one at a time and return the THC reference of every node that was accepted
///
/// A rejected node is logged and skipped, it never stops the remaining requests.
pub fn push_nodes(service: &dyn NodeSyncService, nodes: &[OsmNode]) -> Vec<i64> {
    let mut synced = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        if idx > 0 {
            if let Some(delay) = service.request_delay() {
                thread::sleep(delay);
            }
        }
        match service.add_node(node) {
            Ok(()) => {
                trace!("Added node at {},{}", node.lat, node.lon);
                if let Some(reference) = node.reference() {
                    synced.push(reference);
                }
            }
            Err(e) => error!("Failed to add node at {},{}: {}", node.lat, node.lon, e),
        }
    }
    info!("Pushed {} of {} nodes", synced.len(), nodes.len());
    synced
}
