pub mod access;
pub mod actor;
pub mod graph;
pub mod record;
pub mod scope;

pub use actor::Actor;
pub use graph::{Edge, Graph, build_graph, reachable, reachable_with_depth};
pub use record::{Connection, Dataset, Record};
pub use scope::{ScopeOptions, compute_scoped_dataset, scope_for_actor};
