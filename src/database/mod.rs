//! Connector layer.
//!
//! - [`traits`]: dialects, credentials, values and the adapter trait
//! - [`drivers`]: one adapter per engine
//! - [`Connector`]: a single engine session with auto-commit `execute`
//! - [`ExecutorScope`]: the restricted executor of an open transaction
//! - [`ConnectionResolver`]: connection id to connector lookup

mod connector;
pub mod drivers;
mod executor;
mod resolver;
mod result;
pub mod schema;
pub mod statement;
pub mod traits;

pub use connector::{Connector, Liveness};
pub use executor::{DbExecutor, ExecutorScope};
pub use resolver::{
    connection_id_from_request, ConnectionResolver, DashboardConnection, SharedConnector,
    CONNECTION_ID_HEADER, CONNECTION_ID_QUERY_PARAM,
};
pub use result::{normalize, ExecutionResult};
pub use schema::describe_table;
pub use statement::{classify, StatementKind};
