//! In-memory native driver that records every call.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::NativeError;
use crate::oracle::{
    NativeClient, NativeColumn, NativeDriver, NativeExecuteOptions, NativeOutBind, NativePool,
    NativePoolAttributes, NativeResponse, NativeResultSet, OutFormat, SessionTags,
};
use crate::pool::NativeConnector;
use crate::results::Row;
use crate::types::{BindValue, Params, RowValues};

pub const MOCK_SERVER_VERSION: &str = "19030000";
pub const MOCK_SESSION_ID: i64 = 42;

/// Canned answer for one SQL text.
#[derive(Debug, Clone, Default)]
pub struct MockReply {
    pub meta_data: Option<Vec<NativeColumn>>,
    pub rows: Vec<Vec<RowValues>>,
    pub rows_affected: Option<u64>,
    pub error: Option<NativeError>,
}

impl MockReply {
    /// A query result. Columns are `(name, fetch type, db type)`.
    #[must_use]
    pub fn rows(columns: &[(&str, u32, u32)], rows: Vec<Vec<RowValues>>) -> Self {
        Self {
            meta_data: Some(
                columns
                    .iter()
                    .map(|(name, fetch_type, db_type)| NativeColumn {
                        name: (*name).to_string(),
                        fetch_type: *fetch_type,
                        db_type: *db_type,
                        ..NativeColumn::default()
                    })
                    .collect(),
            ),
            rows,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected: Some(rows_affected),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn error(error: NativeError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// One recorded `execute` call.
#[derive(Debug, Clone)]
pub struct ExecutedStatement {
    pub session: usize,
    pub sql: String,
    pub params: Params,
    pub options: NativeExecuteOptions,
    pub tags: SessionTags,
}

/// Counters of native calls.
#[derive(Debug, Clone, Default)]
pub struct MockStats {
    pub pools_created: usize,
    pub pools_closed: usize,
    pub pool_attributes: Vec<NativePoolAttributes>,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub pings: usize,
    pub result_sets_closed: usize,
    /// `n_rows` argument of every `get_rows` call
    pub fetches: Vec<u32>,
    pub executed: Vec<ExecutedStatement>,
}

impl MockStats {
    /// How many times the session-id query ran.
    #[must_use]
    pub fn session_id_queries(&self) -> usize {
        self.executed
            .iter()
            .filter(|s| s.sql.starts_with("select sid from v$mystat"))
            .count()
    }

    /// Statements other than the per-session setup queries.
    #[must_use]
    pub fn user_statements(&self) -> Vec<&ExecutedStatement> {
        self.executed
            .iter()
            .filter(|s| !s.sql.starts_with("select sid from v$mystat"))
            .collect()
    }
}

#[derive(Debug)]
struct MockConfig {
    server_version: String,
    session_id: Option<RowValues>,
    current_schema: Option<String>,
    create_delay: Duration,
    pool_error: Option<NativeError>,
    pool_close_error: Option<NativeError>,
    session_error: Option<NativeError>,
    replies: HashMap<String, MockReply>,
    returning: HashMap<String, Vec<RowValues>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            server_version: MOCK_SERVER_VERSION.to_string(),
            session_id: Some(RowValues::Int(MOCK_SESSION_ID)),
            current_schema: None,
            create_delay: Duration::ZERO,
            pool_error: None,
            pool_close_error: None,
            session_error: None,
            replies: HashMap::new(),
            returning: HashMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    config: Mutex<MockConfig>,
    stats: Mutex<MockStats>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scriptable fake database behind the native traits.
#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
    shared: Arc<Shared>,
}

impl MockDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver to hand to `OraclePool`.
    #[must_use]
    pub fn driver(&self) -> Arc<dyn NativeDriver> {
        Arc::new(MockDriver {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Connector for `ManagedDriver`.
    #[must_use]
    pub fn connector(&self) -> MockConnector {
        MockConnector {
            shared: Arc::clone(&self.shared),
        }
    }

    #[must_use]
    pub fn stats(&self) -> MockStats {
        lock(&self.shared.stats).clone()
    }

    pub fn reply(&self, sql: &str, reply: MockReply) {
        lock(&self.shared.config)
            .replies
            .insert(sql.to_string(), reply);
    }

    /// Values echoed for an output bind named `name`.
    pub fn returning(&self, name: &str, values: Vec<RowValues>) {
        lock(&self.shared.config)
            .returning
            .insert(name.to_string(), values);
    }

    pub fn set_server_version(&self, version: &str) {
        lock(&self.shared.config).server_version = version.to_string();
    }

    /// Value returned by the session-id query; `None` makes it return no rows.
    pub fn set_session_id(&self, session_id: Option<RowValues>) {
        lock(&self.shared.config).session_id = session_id;
    }

    pub fn set_current_schema(&self, schema: Option<&str>) {
        lock(&self.shared.config).current_schema = schema.map(str::to_string);
    }

    /// Delay every native pool creation.
    pub fn set_create_delay(&self, delay: Duration) {
        lock(&self.shared.config).create_delay = delay;
    }

    pub fn fail_pool_creation(&self, error: Option<NativeError>) {
        lock(&self.shared.config).pool_error = error;
    }

    pub fn fail_pool_close(&self, error: Option<NativeError>) {
        lock(&self.shared.config).pool_close_error = error;
    }

    /// Fail the session-id query of new sessions.
    pub fn fail_session_setup(&self, error: Option<NativeError>) {
        lock(&self.shared.config).session_error = error;
    }
}

struct MockDriver {
    shared: Arc<Shared>,
}

#[async_trait]
impl NativeDriver for MockDriver {
    async fn create_pool(
        &self,
        attributes: &NativePoolAttributes,
    ) -> Result<Arc<dyn NativePool>, NativeError> {
        let (delay, error) = {
            let config = lock(&self.shared.config);
            (config.create_delay, config.pool_error.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        {
            let mut stats = lock(&self.shared.stats);
            stats.pool_attributes.push(attributes.clone());
            if error.is_none() {
                stats.pools_created += 1;
            }
        }
        match error {
            Some(err) => Err(err),
            None => Ok(Arc::new(MockPool {
                shared: Arc::clone(&self.shared),
            })),
        }
    }
}

struct MockPool {
    shared: Arc<Shared>,
}

#[async_trait]
impl NativePool for MockPool {
    async fn get_connection(&self) -> Result<Box<dyn NativeClient>, NativeError> {
        Ok(Box::new(open_client(&self.shared)))
    }

    async fn close(&self) -> Result<(), NativeError> {
        if let Some(err) = lock(&self.shared.config).pool_close_error.clone() {
            return Err(err);
        }
        lock(&self.shared.stats).pools_closed += 1;
        Ok(())
    }
}

/// `NativeConnector` opening mock sessions.
#[derive(Debug, Clone)]
pub struct MockConnector {
    shared: Arc<Shared>,
}

#[async_trait]
impl NativeConnector for MockConnector {
    async fn connect(
        &self,
        _attributes: &NativePoolAttributes,
    ) -> Result<Box<dyn NativeClient>, NativeError> {
        Ok(Box::new(open_client(&self.shared)))
    }
}

fn open_client(shared: &Arc<Shared>) -> MockClient {
    let (server_version, current_schema) = {
        let config = lock(&shared.config);
        (config.server_version.clone(), config.current_schema.clone())
    };
    let mut stats = lock(&shared.stats);
    stats.sessions_opened += 1;
    MockClient {
        shared: Arc::clone(shared),
        session: stats.sessions_opened,
        server_version,
        current_schema,
        session_id: None,
        tags: SessionTags::default(),
    }
}

struct MockClient {
    shared: Arc<Shared>,
    session: usize,
    server_version: String,
    current_schema: Option<String>,
    session_id: Option<RowValues>,
    tags: SessionTags,
}

impl MockClient {
    fn reply_for(&self, sql: &str) -> Result<MockReply, NativeError> {
        let config = lock(&self.shared.config);
        if sql.starts_with("select sid from v$mystat") {
            if let Some(err) = config.session_error.clone() {
                return Err(err);
            }
            return Ok(MockReply::rows(
                &[("SID", 2002, 2)],
                config.session_id.iter().map(|id| vec![id.clone()]).collect(),
            ));
        }
        if let Some(reply) = config.replies.get(sql) {
            return match &reply.error {
                Some(err) => Err(err.clone()),
                None => Ok(reply.clone()),
            };
        }
        if sql.eq_ignore_ascii_case("select 1 from dual") {
            return Ok(MockReply::rows(
                &[("1", 2002, 2)],
                vec![vec![RowValues::Int(1)]],
            ));
        }
        Ok(MockReply::affected(0))
    }

    fn out_binds(&self, params: &Params) -> Option<Vec<NativeOutBind>> {
        let names: Vec<&str> = match params {
            Params::Positional(values) => values
                .iter()
                .filter_map(|v| match v {
                    BindValue::Out { name, .. } => Some(name.as_str()),
                    BindValue::In(_) => None,
                })
                .collect(),
            Params::Named(values) => values
                .iter()
                .filter_map(|(name, v)| match v {
                    BindValue::Out { .. } => Some(name.as_str()),
                    BindValue::In(_) => None,
                })
                .collect(),
        };
        if names.is_empty() {
            return None;
        }
        let config = lock(&self.shared.config);
        Some(
            names
                .into_iter()
                .map(|name| NativeOutBind {
                    name: name.to_string(),
                    values: config
                        .returning
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| vec![RowValues::Int(1)]),
                })
                .collect(),
        )
    }
}

fn shape_rows(
    rows: Vec<Vec<RowValues>>,
    meta: Option<&[NativeColumn]>,
    format: OutFormat,
) -> Vec<Row> {
    rows.into_iter()
        .map(|values| match (format, meta) {
            (OutFormat::Object, Some(columns)) => Row::Object(
                columns
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(values)
                    .collect::<BTreeMap<_, _>>(),
            ),
            _ => Row::Array(values),
        })
        .collect()
}

#[async_trait]
impl NativeClient for MockClient {
    fn server_version(&self) -> String {
        self.server_version.clone()
    }

    fn current_schema(&self) -> Option<String> {
        self.current_schema.clone()
    }

    fn session_id(&self) -> Option<RowValues> {
        self.session_id.clone()
    }

    fn set_session_id(&mut self, session_id: RowValues) {
        self.session_id = Some(session_id);
    }

    fn set_session_tags(&mut self, tags: SessionTags) {
        self.tags = tags;
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: &Params,
        options: &NativeExecuteOptions,
    ) -> Result<NativeResponse, NativeError> {
        lock(&self.shared.stats).executed.push(ExecutedStatement {
            session: self.session,
            sql: sql.to_string(),
            params: params.clone(),
            options: options.clone(),
            tags: self.tags.clone(),
        });

        if let Some(schema) = sql.strip_prefix("ALTER SESSION SET CURRENT_SCHEMA = ") {
            self.current_schema = Some(schema.trim_matches('"').to_string());
            return Ok(NativeResponse::default());
        }

        let reply = self.reply_for(sql)?;
        let mut rows = reply.rows;
        if let Some(max) = options.max_rows.filter(|m| *m > 0) {
            rows.truncate(max as usize);
        }
        let shaped = shape_rows(rows, reply.meta_data.as_deref(), options.out_format);

        let mut response = NativeResponse {
            out_binds: self.out_binds(params),
            rows_affected: reply.rows_affected,
            ..NativeResponse::default()
        };
        if reply.meta_data.is_some() && options.result_set {
            response.result_set = Some(Box::new(MockResultSet {
                shared: Arc::clone(&self.shared),
                rows: shaped.into(),
            }));
        } else if reply.meta_data.is_some() {
            response.rows = Some(shaped);
        }
        response.meta_data = reply.meta_data;
        Ok(response)
    }

    async fn commit(&mut self) -> Result<(), NativeError> {
        lock(&self.shared.stats).commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), NativeError> {
        lock(&self.shared.stats).rollbacks += 1;
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), NativeError> {
        lock(&self.shared.stats).pings += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), NativeError> {
        lock(&self.shared.stats).sessions_closed += 1;
        Ok(())
    }
}

struct MockResultSet {
    shared: Arc<Shared>,
    rows: VecDeque<Row>,
}

#[async_trait]
impl NativeResultSet for MockResultSet {
    async fn get_rows(&mut self, n_rows: u32) -> Result<Vec<Row>, NativeError> {
        lock(&self.shared.stats).fetches.push(n_rows);
        let take = (n_rows as usize).min(self.rows.len());
        Ok(self.rows.drain(..take).collect())
    }

    async fn close(&mut self) -> Result<(), NativeError> {
        lock(&self.shared.stats).result_sets_closed += 1;
        Ok(())
    }
}
