use std::fmt;

use tracing::{trace, warn};

use super::native::NativeResultSet;
use super::options::FieldNaming;
use super::query::tidy_row;
use crate::error::OracleMiddlewareError;
use crate::results::Row;

/// Largest batch pulled per round trip while skipping rows.
const SEEK_BATCH_ROWS: u64 = 100;

/// Pagination column remembered from the statement's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntheticColumn {
    pub index: usize,
    pub name: String,
}

/// Forward-only cursor over a server-side result set.
///
/// Rows are numbered from 1. The cursor closes its server resource as soon as a fetch comes
/// back empty; fetching from an exhausted cursor yields `Ok(None)`.
pub struct OracleCursor {
    result_set: Option<Box<dyn NativeResultSet>>,
    row_number: u64,
    synthetic: Option<SyntheticColumn>,
    naming: Option<FieldNaming>,
    exhausted: bool,
}

impl fmt::Debug for OracleCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleCursor")
            .field("open", &self.result_set.is_some())
            .field("row_number", &self.row_number)
            .field("synthetic", &self.synthetic)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl OracleCursor {
    pub(crate) fn new(
        result_set: Box<dyn NativeResultSet>,
        synthetic: Option<SyntheticColumn>,
        naming: Option<FieldNaming>,
    ) -> Self {
        Self {
            result_set: Some(result_set),
            row_number: 0,
            synthetic,
            naming,
            exhausted: false,
        }
    }

    /// Number of rows consumed so far.
    #[must_use]
    pub fn row_number(&self) -> u64 {
        self.row_number
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.result_set.is_none()
    }

    /// Whether the server reported the end of the result set.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Server-side result sets only move forward.
    #[must_use]
    pub fn bidirectional(&self) -> bool {
        false
    }

    /// Fetch rows `from_row..=to_row`, skipping any gap after the current position first.
    ///
    /// # Errors
    /// `InvalidRange` for backward ranges or a start at or behind the current position,
    /// `ClosedCursor` after an explicit `close`, `Native` for driver failures.
    pub async fn fetch(
        &mut self,
        from_row: u64,
        to_row: u64,
    ) -> Result<Option<Vec<Row>>, OracleMiddlewareError> {
        if to_row < from_row {
            return Err(OracleMiddlewareError::InvalidRange(
                "backward fetch unsupported".to_string(),
            ));
        }
        if from_row == 0 {
            return Err(OracleMiddlewareError::InvalidRange(
                "rows are numbered from 1".to_string(),
            ));
        }
        if from_row <= self.row_number {
            return Err(OracleMiddlewareError::InvalidRange(format!(
                "row {from_row} is behind the cursor position {}",
                self.row_number
            )));
        }
        if !self.ensure_open()? {
            return Ok(None);
        }

        if from_row - 1 > self.row_number {
            let gap = from_row - 1 - self.row_number;
            self.skip(gap).await?;
            if self.result_set.is_none() {
                return Ok(None);
            }
        }
        let count = to_row - self.row_number;
        self.fetch_rows(count).await
    }

    /// Fetch the next `n_rows` rows from the current position.
    ///
    /// # Errors
    /// Same as [`OracleCursor::fetch`].
    pub async fn next_batch(&mut self, n_rows: u64) -> Result<Option<Vec<Row>>, OracleMiddlewareError> {
        if n_rows == 0 {
            return Ok(Some(Vec::new()));
        }
        let from = self.row_number + 1;
        self.fetch(from, self.row_number.saturating_add(n_rows)).await
    }

    /// Skip `steps` rows, fetching in batches and yielding to the scheduler between them.
    ///
    /// # Errors
    /// `InvalidRange` for negative steps, `ClosedCursor` after an explicit `close`.
    pub async fn seek(&mut self, steps: i64) -> Result<(), OracleMiddlewareError> {
        let steps = u64::try_from(steps).map_err(|_| {
            OracleMiddlewareError::InvalidRange("cursor can not move back".to_string())
        })?;
        if !self.ensure_open()? {
            return Ok(());
        }
        self.skip(steps).await
    }

    /// Close the server-side result set. Closing again is a no-op.
    ///
    /// # Errors
    /// Returns `OracleMiddlewareError::Native` if the native close fails.
    pub async fn close(&mut self) -> Result<(), OracleMiddlewareError> {
        if let Some(mut result_set) = self.result_set.take() {
            result_set.close().await?;
            trace!(rows = self.row_number, "cursor closed");
        }
        Ok(())
    }

    /// `Ok(false)` when exhausted, error when closed by the caller.
    fn ensure_open(&self) -> Result<bool, OracleMiddlewareError> {
        if self.result_set.is_some() {
            Ok(true)
        } else if self.exhausted {
            Ok(false)
        } else {
            Err(OracleMiddlewareError::ClosedCursor)
        }
    }

    async fn skip(&mut self, steps: u64) -> Result<(), OracleMiddlewareError> {
        let mut remaining = steps;
        while remaining > 0 {
            let batch = remaining.min(SEEK_BATCH_ROWS);
            match self.fetch_rows(batch).await? {
                Some(rows) => remaining = remaining.saturating_sub(rows.len() as u64),
                None => break,
            }
            if remaining > 0 {
                tokio::task::yield_now().await;
            }
        }
        Ok(())
    }

    async fn fetch_rows(&mut self, count: u64) -> Result<Option<Vec<Row>>, OracleMiddlewareError> {
        let Some(result_set) = self.result_set.as_mut() else {
            return Ok(None);
        };
        let n_rows = u32::try_from(count).unwrap_or(u32::MAX);
        let mut rows = result_set.get_rows(n_rows).await?;

        if rows.is_empty() {
            self.exhausted = true;
            trace!(rows = self.row_number, "cursor exhausted");
            self.close().await?;
            return Ok(None);
        }

        self.row_number += rows.len() as u64;
        for row in &mut rows {
            tidy_row(row, self.synthetic.as_ref(), self.naming);
        }
        Ok(Some(rows))
    }
}

impl Drop for OracleCursor {
    fn drop(&mut self) {
        if self.result_set.is_some() {
            warn!(
                rows = self.row_number,
                "cursor dropped while open; server-side result set released by the driver"
            );
        }
    }
}
