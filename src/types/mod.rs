//! Core types of the diagram model.

pub mod node;
pub mod endpoint;
pub mod diagram;
pub mod topology;
pub mod sanity;
mod order;

pub use node::{Node, NodeId, NodeKind, CROSSING_DEGREE};
pub use endpoint::{Attributes, Endpoint, EndpointKind, Slot};
pub use diagram::{DiagramError, PlanarDiagram};
pub use topology::Face;
pub use sanity::SanityViolation;
