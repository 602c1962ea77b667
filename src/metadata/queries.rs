use tracing::debug;

use super::catalog::{
    ColumnInfo, ForeignKeyInfo, PrimaryKeyInfo, SchemaInfo, TableInfo, aggregate_keys,
};
use crate::connection::MiddlewareConnection;
use crate::error::OracleMiddlewareError;
use crate::oracle::{ExecuteOptions, FieldNaming};
use crate::results::Row;
use crate::types::{Params, RowValues};

pub const SCHEMAS_SQL: &str = "select username schema_name, created create_date \
     from all_users \
     order by username";

pub const TABLES_SQL: &str = "select tbl.owner schema_name, tbl.table_name, tbl.num_rows, tbl.read_only, \
     (select atc.comments from all_tab_comments atc \
       where atc.owner = tbl.owner and atc.table_name = tbl.table_name) table_comments \
     from all_tables tbl \
     where (:schema_name is null or tbl.owner = :schema_name) \
     order by tbl.owner, tbl.table_name";

pub const COLUMNS_SQL: &str = "select atc.owner schema_name, atc.table_name, atc.column_name, atc.data_type, \
     atc.data_length, atc.data_precision, atc.data_scale, atc.char_length, \
     atc.data_default default_value, atc.nullable, \
     (select acc.comments from all_col_comments acc \
       where acc.owner = atc.owner and acc.table_name = atc.table_name \
         and acc.column_name = atc.column_name) column_comments \
     from all_tab_columns atc \
     where (:schema_name is null or atc.owner = :schema_name) \
       and (:table_name is null or atc.table_name = :table_name) \
     order by atc.owner, atc.table_name, atc.column_id";

pub const PRIMARY_KEYS_SQL: &str = "select ac.owner schema_name, ac.table_name, ac.constraint_name, ac.status, \
     to_char(listagg(acc.column_name, ',') within group (order by acc.position)) columns \
     from all_constraints ac \
     inner join all_cons_columns acc on acc.owner = ac.owner \
       and acc.table_name = ac.table_name and acc.constraint_name = ac.constraint_name \
     where ac.constraint_type = 'P' \
       and (:schema_name is null or ac.owner = :schema_name) \
       and (:table_name is null or ac.table_name = :table_name) \
     group by ac.owner, ac.table_name, ac.constraint_name, ac.status \
     order by ac.owner, ac.table_name, ac.constraint_name";

pub const FOREIGN_KEYS_SQL: &str = "select ac.owner schema_name, ac.table_name, ac.constraint_name, ac.status, \
     to_char(listagg(acc.column_name, ',') within group (order by acc.position)) column_name, \
     to_char(listagg(ac.r_owner, ',') within group (order by acc.position)) r_schema, \
     to_char(listagg(acr.table_name, ',') within group (order by acc.position)) r_table_name, \
     to_char(listagg(acr.column_name, ',') within group (order by acc.position)) r_columns \
     from all_constraints ac \
     inner join all_cons_columns acc on acc.owner = ac.owner \
       and acc.table_name = ac.table_name and acc.constraint_name = ac.constraint_name \
     inner join all_cons_columns acr on acr.owner = ac.r_owner \
       and acr.constraint_name = ac.r_constraint_name and acr.position = acc.position \
     where ac.constraint_type = 'R' \
       and (:schema_name is null or ac.owner = :schema_name) \
       and (:table_name is null or ac.table_name = :table_name) \
     group by ac.owner, ac.table_name, ac.constraint_name, ac.status \
     order by ac.owner, ac.table_name, ac.constraint_name";

/// Catalog introspection over any [`MiddlewareConnection`].
///
/// Filters are compared verbatim; the catalog stores unquoted identifiers upper-cased.
pub struct Metadata<'c, C: MiddlewareConnection + ?Sized> {
    conn: &'c mut C,
}

impl<'c, C: MiddlewareConnection + ?Sized> Metadata<'c, C> {
    pub fn new(conn: &'c mut C) -> Self {
        Self { conn }
    }

    /// # Errors
    /// Propagates execute failures; `Protocol` for malformed catalog rows.
    pub async fn schemas(&mut self) -> Result<Vec<SchemaInfo>, OracleMiddlewareError> {
        let rows = self.rows(SCHEMAS_SQL, Params::default()).await?;
        rows.iter().map(SchemaInfo::from_row).collect()
    }

    /// # Errors
    /// Propagates execute failures; `Protocol` for malformed catalog rows.
    pub async fn tables(
        &mut self,
        schema: Option<&str>,
    ) -> Result<Vec<TableInfo>, OracleMiddlewareError> {
        let params = Params::named([("schema_name", optional(schema))]);
        let rows = self.rows(TABLES_SQL, params).await?;
        rows.iter().map(TableInfo::from_row).collect()
    }

    /// # Errors
    /// Propagates execute failures; `Protocol` for malformed catalog rows.
    pub async fn columns(
        &mut self,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> Result<Vec<ColumnInfo>, OracleMiddlewareError> {
        let rows = self.rows(COLUMNS_SQL, filter(schema, table)).await?;
        rows.iter().map(ColumnInfo::from_row).collect()
    }

    /// # Errors
    /// Propagates execute failures; `Protocol` for malformed catalog rows.
    pub async fn primary_keys(
        &mut self,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> Result<Vec<PrimaryKeyInfo>, OracleMiddlewareError> {
        let rows = self.rows(PRIMARY_KEYS_SQL, filter(schema, table)).await?;
        let keys = rows
            .iter()
            .map(PrimaryKeyInfo::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(aggregate_keys(keys))
    }

    /// # Errors
    /// Propagates execute failures; `Protocol` for malformed catalog rows.
    pub async fn foreign_keys(
        &mut self,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> Result<Vec<ForeignKeyInfo>, OracleMiddlewareError> {
        let rows = self.rows(FOREIGN_KEYS_SQL, filter(schema, table)).await?;
        let keys = rows
            .iter()
            .map(ForeignKeyInfo::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(aggregate_keys(keys))
    }

    async fn rows(&mut self, sql: &str, params: Params) -> Result<Vec<Row>, OracleMiddlewareError> {
        let options = ExecuteOptions {
            object_rows: true,
            naming: Some(FieldNaming::Lowercase),
            ..ExecuteOptions::default()
        };
        let result = self.conn.execute(sql, &params, &options).await?;
        let rows = result.rows.ok_or_else(|| {
            OracleMiddlewareError::Protocol("catalog query returned no row set".to_string())
        })?;
        debug!(rows = rows.len(), "catalog query");
        Ok(rows)
    }
}

fn optional(value: Option<&str>) -> RowValues {
    value.map_or(RowValues::Null, |v| RowValues::Text(v.to_string()))
}

fn filter(schema: Option<&str>, table: Option<&str>) -> Params {
    Params::named([
        ("schema_name", optional(schema)),
        ("table_name", optional(table)),
    ])
}
