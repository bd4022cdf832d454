//! In-memory database.
//!
//! [`MemoryServer`] holds tables and accounts; every [`MemorySession`]
//! opened from it is one client connection implementing
//! [`DatabaseClient`]. The query interpreter understands the statements the
//! ORM emits plus `DELETE FROM <table>` and `THROW <message>`:
//!
//! ```text
//! SELECT * FROM <table> [WHERE <cond> [AND <cond>]...] [LIMIT <n>]
//! <cond> := <field> = $<param> | id = type::thing($<param>, $<param>)
//! ```
//!
//! A `THROW` statement always answers with an `ERR` envelope.
//!
//! Keywords are matched case-sensitively.

use async_trait::async_trait;
use entiorm_client::{ClientFactory, Credentials, DatabaseClient, DriverError, DriverResult, Scope};
use entiorm_core::{Record, RecordId, ID_FIELD};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// Shape of statement results returned by `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseStyle {
    /// Each statement result is the bare row array.
    #[default]
    Bare,
    /// Each statement result is `{ "status": "OK", "time": .., "result": rows }`.
    Envelope,
}

type Tables = BTreeMap<String, Vec<Record>>;

struct ServerState {
    databases: RwLock<HashMap<(String, String), Tables>>,
    accounts: RwLock<Vec<Credentials>>,
    defaults: RwLock<HashMap<String, Record>>,
    reachable: AtomicBool,
    read_only: AtomicBool,
    style: RwLock<ResponseStyle>,
    requests: AtomicUsize,
    log: Mutex<Vec<String>>,
}

/// Shared state of an in-memory database.
///
/// Cloning yields another handle to the same data.
#[derive(Clone)]
pub struct MemoryServer {
    inner: Arc<ServerState>,
}

impl MemoryServer {
    /// Creates a reachable server with a `root`/`root` root account.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ServerState {
                databases: RwLock::new(HashMap::new()),
                accounts: RwLock::new(vec![Credentials {
                    username: "root".into(),
                    password: "root".into(),
                    namespace: None,
                    database: None,
                }]),
                defaults: RwLock::new(HashMap::new()),
                reachable: AtomicBool::new(true),
                read_only: AtomicBool::new(false),
                style: RwLock::new(ResponseStyle::default()),
                requests: AtomicUsize::new(0),
                log: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Adds an account. The namespace and database of `credentials` decide
    /// at which level it can sign in.
    pub fn add_account(&self, credentials: Credentials) {
        self.inner.accounts.write().push(credentials);
    }

    /// Makes the server reachable or not. While unreachable, connects,
    /// pings and every data call fail.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Makes the server read-only or not. While read-only, the create,
    /// update and delete calls fail; queries still run.
    pub fn set_read_only(&self, read_only: bool) {
        self.inner.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Selects the shape of query responses.
    pub fn set_response_style(&self, style: ResponseStyle) {
        *self.inner.style.write() = style;
    }

    /// Sets a value `create` fills in when the payload lacks `field`.
    pub fn set_default(&self, table: &str, field: &str, value: Value) {
        self.inner
            .defaults
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Opens a new, unconnected session.
    pub fn session(&self) -> MemorySession {
        MemorySession {
            server: self.clone(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Returns a factory opening a new session per connection attempt.
    pub fn factory(&self) -> impl ClientFactory + 'static {
        let server = self.clone();
        move || -> Arc<dyn DatabaseClient> { Arc::new(server.session()) }
    }

    /// Number of data calls (query, create, update, delete) received.
    pub fn request_count(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }

    /// Query texts received, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.inner.log.lock().clone()
    }

    /// Rows currently stored in one table.
    pub fn rows(&self, namespace: &str, database: &str, table: &str) -> Vec<Record> {
        self.inner
            .databases
            .read()
            .get(&(namespace.to_string(), database.to_string()))
            .and_then(|tables| tables.get(table))
            .cloned()
            .unwrap_or_default()
    }

    fn is_reachable(&self) -> bool {
        self.inner.reachable.load(Ordering::SeqCst)
    }

    fn authenticate(&self, credentials: &Credentials) -> bool {
        self.inner.accounts.read().iter().any(|account| account == credentials)
    }

    fn with_tables<R>(&self, scope: &(String, String), f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut databases = self.inner.databases.write();
        f(databases.entry(scope.clone()).or_default())
    }
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    connected: bool,
    signed_in: bool,
    scope: Option<(String, String)>,
}

/// One client connection to a [`MemoryServer`].
pub struct MemorySession {
    server: MemoryServer,
    state: Mutex<SessionState>,
}

impl MemorySession {
    fn ensure_connected(&self) -> DriverResult<()> {
        if !self.state.lock().connected {
            return Err(DriverError::new("no connection; call connect first"));
        }
        if !self.server.is_reachable() {
            return Err(DriverError::new("connection lost"));
        }
        Ok(())
    }

    /// Checks readiness for a data call and counts it.
    fn ready_scope(&self) -> DriverResult<(String, String)> {
        self.ensure_connected()?;
        let state = self.state.lock();
        if !state.signed_in {
            return Err(DriverError::new("not signed in"));
        }
        let scope = state
            .scope
            .clone()
            .ok_or_else(|| DriverError::new("specify a namespace and database to use"))?;
        self.server.inner.requests.fetch_add(1, Ordering::SeqCst);
        Ok(scope)
    }

    /// Like [`Self::ready_scope`], also requiring a writable server.
    fn writable_scope(&self) -> DriverResult<(String, String)> {
        let scope = self.ready_scope()?;
        if self.server.inner.read_only.load(Ordering::SeqCst) {
            return Err(DriverError::new("database is read-only"));
        }
        Ok(scope)
    }
}

#[async_trait]
impl DatabaseClient for MemorySession {
    async fn connect(&self, url: &str) -> DriverResult<()> {
        if !self.server.is_reachable() {
            return Err(DriverError::new(format!("connection refused: {url}")));
        }
        self.state.lock().connected = true;
        Ok(())
    }

    async fn signin(&self, credentials: &Credentials) -> DriverResult<()> {
        self.ensure_connected()?;
        if !self.server.authenticate(credentials) {
            return Err(DriverError::new("There was a problem with authentication"));
        }
        self.state.lock().signed_in = true;
        Ok(())
    }

    async fn use_scope(&self, scope: &Scope) -> DriverResult<()> {
        self.ensure_connected()?;
        self.state.lock().scope = Some((scope.namespace.clone(), scope.database.clone()));
        Ok(())
    }

    async fn query(&self, text: &str, params: Record) -> DriverResult<Vec<Value>> {
        let scope = self.ready_scope()?;
        self.server.inner.log.lock().push(text.to_string());
        trace!(query = %text, "memory query");

        let statements = text
            .split(';')
            .map(str::trim)
            .filter(|statement| !statement.is_empty())
            .map(parse_statement)
            .collect::<DriverResult<Vec<_>>>()?;

        let style = *self.server.inner.style.read();
        self.server.with_tables(&scope, |tables| {
            statements
                .iter()
                .map(|statement| execute(tables, statement, &params, style))
                .collect()
        })
    }

    async fn create(&self, table: &str, mut payload: Record) -> DriverResult<Vec<Record>> {
        let scope = self.writable_scope()?;
        if let Some(defaults) = self.server.inner.defaults.read().get(table) {
            for (field, value) in defaults {
                payload.entry(field.clone()).or_insert_with(|| value.clone());
            }
        }
        let key = Uuid::new_v4().simple().to_string();
        payload.insert(
            ID_FIELD.to_string(),
            Value::String(RecordId::new(table, key).to_string()),
        );

        self.server.with_tables(&scope, |tables| {
            tables.entry(table.to_string()).or_default().push(payload.clone());
        });
        Ok(vec![payload])
    }

    async fn update(&self, id: &RecordId, mut payload: Record) -> DriverResult<Record> {
        let scope = self.writable_scope()?;
        let reference = id.to_string();
        payload.insert(ID_FIELD.to_string(), Value::String(reference.clone()));

        self.server.with_tables(&scope, |tables| {
            let rows = tables.entry(id.table().to_string()).or_default();
            match rows.iter_mut().find(|row| row_id(row) == Some(reference.as_str())) {
                Some(row) => *row = payload.clone(),
                None => rows.push(payload.clone()),
            }
        });
        Ok(payload)
    }

    async fn delete(&self, id: &RecordId) -> DriverResult<()> {
        let scope = self.writable_scope()?;
        let reference = id.to_string();
        self.server.with_tables(&scope, |tables| {
            if let Some(rows) = tables.get_mut(id.table()) {
                rows.retain(|row| row_id(row) != Some(reference.as_str()));
            }
        });
        Ok(())
    }

    async fn ping(&self) -> DriverResult<()> {
        self.ensure_connected()
    }

    async fn close(&self) -> DriverResult<()> {
        *self.state.lock() = SessionState::default();
        Ok(())
    }
}

fn row_id(row: &Record) -> Option<&str> {
    row.get(ID_FIELD).and_then(Value::as_str)
}

#[derive(Debug, PartialEq)]
enum Cond {
    Eq { field: String, param: String },
    Thing { table_param: String, id_param: String },
}

#[derive(Debug, PartialEq)]
enum Statement {
    Select {
        table: String,
        conditions: Vec<Cond>,
        limit: Option<usize>,
    },
    Delete {
        table: String,
    },
    Throw {
        message: String,
    },
}

fn parse_error(statement: &str) -> DriverError {
    DriverError::new(format!("parse error: unsupported statement `{statement}`"))
}

fn parse_statement(statement: &str) -> DriverResult<Statement> {
    let normalized = statement.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(message) = normalized.strip_prefix("THROW ") {
        return Ok(Statement::Throw {
            message: message.trim_matches(|c| c == '"' || c == '\'').to_string(),
        });
    }

    if let Some(table) = normalized
        .strip_prefix("DELETE FROM ")
        .or_else(|| normalized.strip_prefix("DELETE "))
    {
        if table.is_empty() || table.contains(' ') {
            return Err(parse_error(statement));
        }
        return Ok(Statement::Delete {
            table: table.to_string(),
        });
    }

    let rest = normalized
        .strip_prefix("SELECT * FROM ")
        .ok_or_else(|| parse_error(statement))?;
    let (rest, limit) = match rest.split_once(" LIMIT ") {
        Some((head, n)) => (
            head,
            Some(n.trim().parse::<usize>().map_err(|_| parse_error(statement))?),
        ),
        None => (rest, None),
    };
    let (table, conditions) = match rest.split_once(" WHERE ") {
        Some((table, clause)) => (
            table,
            clause
                .split(" AND ")
                .map(|cond| parse_condition(cond).ok_or_else(|| parse_error(statement)))
                .collect::<DriverResult<Vec<_>>>()?,
        ),
        None => (rest, Vec::new()),
    };
    if table.is_empty() || table.contains(' ') {
        return Err(parse_error(statement));
    }

    Ok(Statement::Select {
        table: table.to_string(),
        conditions,
        limit,
    })
}

fn parse_condition(cond: &str) -> Option<Cond> {
    let (field, rhs) = cond.split_once(" = ")?;
    if let Some(args) = rhs
        .strip_prefix("type::thing(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let (table_arg, id_arg) = args.split_once(',')?;
        return Some(Cond::Thing {
            table_param: table_arg.trim().strip_prefix('$')?.to_string(),
            id_param: id_arg.trim().strip_prefix('$')?.to_string(),
        });
    }
    Some(Cond::Eq {
        field: field.trim().to_string(),
        param: rhs.trim().strip_prefix('$')?.to_string(),
    })
}

fn param<'p>(params: &'p Record, name: &str) -> DriverResult<&'p Value> {
    params
        .get(name)
        .ok_or_else(|| DriverError::new(format!("missing parameter ${name}")))
}

fn matches(row: &Record, cond: &Cond, params: &Record) -> DriverResult<bool> {
    match cond {
        Cond::Eq { field, param: name } => {
            let expected = param(params, name)?;
            Ok(row.get(field).unwrap_or(&Value::Null) == expected)
        }
        Cond::Thing {
            table_param,
            id_param,
        } => {
            let table = param(params, table_param)?
                .as_str()
                .ok_or_else(|| DriverError::new("type::thing expects a table name"))?;
            let key = match param(params, id_param)? {
                Value::String(key) => key
                    .strip_prefix(table)
                    .and_then(|rest| rest.strip_prefix(':'))
                    .unwrap_or(key)
                    .to_string(),
                other => other.to_string(),
            };
            Ok(row_id(row) == Some(RecordId::new(table, key).to_string().as_str()))
        }
    }
}

fn wrap(rows: Vec<Record>, style: ResponseStyle) -> Value {
    let rows = Value::Array(rows.into_iter().map(Value::Object).collect());
    match style {
        ResponseStyle::Bare => rows,
        ResponseStyle::Envelope => json!({ "status": "OK", "time": "0ns", "result": rows }),
    }
}

fn execute(
    tables: &mut Tables,
    statement: &Statement,
    params: &Record,
    style: ResponseStyle,
) -> DriverResult<Value> {
    match statement {
        Statement::Select {
            table,
            conditions,
            limit,
        } => {
            let cap = limit.unwrap_or(usize::MAX);
            let mut found = Vec::new();
            for row in tables.get(table).map(Vec::as_slice).unwrap_or_default() {
                if found.len() >= cap {
                    break;
                }
                let mut keep = true;
                for cond in conditions {
                    if !matches(row, cond, params)? {
                        keep = false;
                        break;
                    }
                }
                if keep {
                    found.push(row.clone());
                }
            }
            Ok(wrap(found, style))
        }
        Statement::Delete { table } => {
            tables.remove(table);
            Ok(wrap(Vec::new(), style))
        }
        Statement::Throw { message } => {
            Ok(json!({ "status": "ERR", "time": "0ns", "result": message }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_emitted_select() {
        let statement =
            parse_statement("SELECT * FROM users WHERE email = $email AND id = type::thing($table, $id) LIMIT 1")
                .unwrap();
        assert_eq!(
            statement,
            Statement::Select {
                table: "users".into(),
                conditions: vec![
                    Cond::Eq {
                        field: "email".into(),
                        param: "email".into()
                    },
                    Cond::Thing {
                        table_param: "table".into(),
                        id_param: "id".into()
                    },
                ],
                limit: Some(1),
            }
        );
    }

    #[test]
    fn parses_delete_and_scan() {
        assert_eq!(
            parse_statement("DELETE FROM users").unwrap(),
            Statement::Delete {
                table: "users".into()
            }
        );
        assert!(matches!(
            parse_statement("SELECT * FROM users").unwrap(),
            Statement::Select { ref conditions, limit: None, .. } if conditions.is_empty()
        ));
    }

    #[test]
    fn throw_answers_with_error_envelope() {
        let statement = parse_statement(r#"THROW "boom""#).unwrap();
        assert_eq!(
            statement,
            Statement::Throw {
                message: "boom".into()
            }
        );
        let mut tables = Tables::new();
        let result = execute(&mut tables, &statement, &Record::new(), ResponseStyle::Bare).unwrap();
        assert_eq!(result, json!({ "status": "ERR", "time": "0ns", "result": "boom" }));
    }

    #[test]
    fn rejects_unsupported_statements() {
        assert!(parse_statement("SELEC * FROM users").is_err());
        assert!(parse_statement("SELECT * FROM users WHERE age > $age").is_err());
        assert!(parse_statement("SELECT * FROM users LIMIT many").is_err());
    }

    #[test]
    fn thing_condition_accepts_key_or_full_reference() {
        let row = json!({ "id": "users:k1" }).as_object().cloned().unwrap();
        let cond = Cond::Thing {
            table_param: "table".into(),
            id_param: "id".into(),
        };
        for id in ["k1", "users:k1"] {
            let params = json!({ "table": "users", "id": id }).as_object().cloned().unwrap();
            assert!(matches(&row, &cond, &params).unwrap());
        }
    }
}
