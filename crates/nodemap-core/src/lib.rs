//! Nodemap Core - typed in-memory graph store and projection engine
//!
//! Instances carry type labels, an optional scalar value and named,
//! bidirectional, multi-valued links. Queries walk the graph from every
//! instance of a root type along a (possibly branching) path and return
//! detached projection trees.

pub mod engine;
pub mod error;
pub mod instance;
pub mod label;
pub mod load;
pub mod projection;
pub mod query;
pub mod render;
pub mod shared;
pub mod store;

pub use engine::{QueryEngine, QueryStats};
pub use error::{Error, Result};
pub use instance::{Handle, LinkCollection, NodeInstance};
pub use label::{InstanceId, Label, ScalarValue};
pub use load::{bulk_load, load_json, BrokenLink, LoadRecord, LoadReport};
pub use projection::Projection;
pub use query::{PathStep, QueryPath, QueryTree};
pub use render::ProjectionTree;
pub use shared::SharedGraphStore;
pub use store::GraphStore;
