//! Error types for MargaNav

use crate::graph::NodeId;
use thiserror::Error;

/// MargaNav error type
#[derive(Error, Debug)]
pub enum NavError {
    #[error("Position unresolved: no detection and no prediction")]
    PositionUnresolved,

    #[error("Obstacle ahead: heading {heading:.0}° not clear for {distance:.0}px")]
    ObstacleAhead { heading: f32, distance: f32 },

    #[error("Waypoint {node} not reached after {attempts} attempts ({distance:.1}px away)")]
    WaypointRetryExhausted {
        node: NodeId,
        attempts: u32,
        distance: f32,
    },

    #[error("No path from node {from} to node {to}")]
    NoPathFound { from: NodeId, to: NodeId },

    #[error("Unknown graph node: {0}")]
    UnknownNode(NodeId),

    #[error("Actuator failure: {0}")]
    Actuator(#[from] chakra_io::Error),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for NavError {
    fn from(e: serde_json::Error) -> Self {
        NavError::Graph(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
