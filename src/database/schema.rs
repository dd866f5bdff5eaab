//! Table introspection entry point.

use super::connector::Connector;
use super::traits::TableColumn;
use crate::error::Result;

/// Columns of `table` on `connector`, in declaration order.
///
/// `table` is `name` or `schema.name`. A missing table is a
/// [`SchemaIntrospection`](crate::error::ConnectorError::SchemaIntrospection)
/// error ("table not found"), never an empty list.
pub async fn describe_table(connector: &mut Connector, table: &str) -> Result<Vec<TableColumn>> {
    connector.describe_table(table).await
}
