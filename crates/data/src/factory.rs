//! Data factory: APIs, servers, databases, users and the engines built from them

use crate::descriptor::ConnectionDescriptor;
use crate::engine::{Connection, Cursor, EngineHandle, EngineOptions, EngineProvider, RawConnection};
use crate::model::{DatabaseRef, DbApi, DbUser, ServerRef};
use crate::scope;
use crate::sqlite::SqliteProvider;
use std::sync::Arc;
use testbed_common::registry::{same_instance, Fixture, Registry};
use testbed_common::{Error, HarnessConfig, Result, TransactionPolicy};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Api,
    Server,
    Database,
    User,
    Engine,
}

/// Everything a [`DataFactory`] can hold
#[derive(Debug, Clone)]
pub enum DataFixture {
    Api(Arc<DbApi>),
    Server(ServerRef),
    Database(DatabaseRef),
    User(Arc<DbUser>),
    Engine(EngineHandle),
}

impl Fixture for DataFixture {
    type Kind = DataKind;

    fn kind(&self) -> DataKind {
        match self {
            DataFixture::Api(_) => DataKind::Api,
            DataFixture::Server(_) => DataKind::Server,
            DataFixture::Database(_) => DataKind::Database,
            DataFixture::User(_) => DataKind::User,
            DataFixture::Engine(_) => DataKind::Engine,
        }
    }

    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (DataFixture::Api(a), DataFixture::Api(b)) => Arc::ptr_eq(a, b),
            (DataFixture::Server(a), DataFixture::Server(b)) => Arc::ptr_eq(a, b),
            (DataFixture::Database(a), DataFixture::Database(b)) => Arc::ptr_eq(a, b),
            (DataFixture::User(a), DataFixture::User(b)) => Arc::ptr_eq(a, b),
            (DataFixture::Engine(a), DataFixture::Engine(b)) => same_instance(a, b),
            _ => false,
        }
    }
}

macro_rules! stored {
    ($self:ident, $kind:ident) => {
        $self
            .registry
            .list(DataKind::$kind, &[])
            .into_iter()
            .filter_map(|f| match f {
                DataFixture::$kind(inner) => Some(inner),
                _ => None,
            })
            .collect()
    };
}

/// Registry of the database side of a system under test
#[derive(Debug)]
pub struct DataFactory {
    registry: Registry<DataFixture>,
    provider: Arc<dyn EngineProvider>,
    transaction_policy: TransactionPolicy,
}

impl Default for DataFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFactory {
    /// Factory backed by the bundled SQLite provider
    pub fn new() -> Self {
        Self::with_provider(Arc::new(SqliteProvider))
    }

    pub fn with_provider(provider: Arc<dyn EngineProvider>) -> Self {
        Self::with_config(provider, &HarnessConfig::default())
    }

    pub fn with_config(provider: Arc<dyn EngineProvider>, config: &HarnessConfig) -> Self {
        Self {
            registry: Registry::with_policy(config.registry.on_name_collision),
            provider,
            transaction_policy: config.data.transaction_policy,
        }
    }

    pub fn registry(&self) -> &Registry<DataFixture> {
        &self.registry
    }

    pub fn transaction_policy(&self) -> TransactionPolicy {
        self.transaction_policy
    }

    pub fn set_transaction_policy(&mut self, policy: TransactionPolicy) -> &mut Self {
        self.transaction_policy = policy;
        self
    }

    /// Store a driver API and attach it to every stored server of its dialect
    pub fn add_db_api(&mut self, name: &str, dialect: &str) -> Result<Arc<DbApi>> {
        let api = Arc::new(DbApi::new(name, dialect));
        self.registry
            .store(name, DataFixture::Api(api.clone()), DataKind::Api)?;

        for server in self.servers() {
            let mut server = server.write();
            if server.dialect == api.dialect {
                debug!("Attaching api {} to {} server {}", name, server.dialect, server.ip);
                server.set_api(api.clone());
            }
        }
        Ok(api)
    }

    /// Store a server, attaching the last stored API of its dialect
    pub fn add_server(&mut self, name: &str, server: ServerRef) -> Result<&mut Self> {
        let dialect = server.read().dialect.clone();
        let api = self
            .apis()
            .into_iter()
            .filter(|api| api.dialect == dialect)
            .last();

        self.registry
            .store(name, DataFixture::Server(server.clone()), DataKind::Server)?;
        if let Some(api) = api {
            server.write().set_api(api);
        }
        Ok(self)
    }

    /// Attach a database to the server stored as `server_name` and store it under its own name
    pub fn add_database(&mut self, server_name: &str, database: DatabaseRef) -> Result<&mut Self> {
        let server = match self.registry.get(server_name) {
            Some(DataFixture::Server(server)) => server.clone(),
            Some(other) => {
                return Err(Error::not_found(
                    "Server",
                    format!("{} (stored as {:?})", server_name, other.kind()),
                ))
            }
            None => return Err(Error::not_found("Server", server_name)),
        };

        let name = database.read().name.clone();
        self.registry
            .store(&name, DataFixture::Database(database.clone()), DataKind::Database)?;

        database.write().set_server(server.clone());
        server.write().attach_database(&database);
        Ok(self)
    }

    /// Store a user under its username
    pub fn add_user(&mut self, user: Arc<DbUser>) -> Result<&mut Self> {
        let name = user.username.clone();
        self.registry
            .store(&name, DataFixture::User(user), DataKind::User)?;
        Ok(self)
    }

    /// Build an engine for `user` on `database` and store it as `name`
    ///
    /// Both fixtures must be the very instances stored in this factory.
    pub fn build_engine(
        &mut self,
        name: &str,
        database: &DatabaseRef,
        user: &Arc<DbUser>,
        options: &EngineOptions,
    ) -> Result<EngineHandle> {
        if !self.registry.contains(&DataFixture::Database(database.clone())) {
            return Err(Error::not_found("Database", database.read().name.clone()));
        }
        if !self.registry.contains(&DataFixture::User(user.clone())) {
            return Err(Error::not_found("User", user.username.clone()));
        }

        let descriptor = ConnectionDescriptor::build(database, user)?;
        info!("Building engine {} for {}", name, descriptor.redacted());
        let engine = self
            .provider
            .create_engine(&descriptor.to_string(), options)?;

        self.registry
            .store(name, DataFixture::Engine(engine.clone()), DataKind::Engine)?;
        Ok(engine)
    }

    pub fn servers(&self) -> Vec<ServerRef> {
        stored!(self, Server)
    }

    pub fn databases(&self) -> Vec<DatabaseRef> {
        stored!(self, Database)
    }

    pub fn users(&self) -> Vec<Arc<DbUser>> {
        stored!(self, User)
    }

    pub fn engines(&self) -> Vec<EngineHandle> {
        stored!(self, Engine)
    }

    pub fn apis(&self) -> Vec<Arc<DbApi>> {
        stored!(self, Api)
    }

    pub fn server(&self, name: &str) -> Option<ServerRef> {
        match self.registry.get(name) {
            Some(DataFixture::Server(server)) => Some(server.clone()),
            _ => None,
        }
    }

    pub fn database(&self, name: &str) -> Option<DatabaseRef> {
        match self.registry.get(name) {
            Some(DataFixture::Database(db)) => Some(db.clone()),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<Arc<DbUser>> {
        match self.registry.get(name) {
            Some(DataFixture::User(user)) => Some(user.clone()),
            _ => None,
        }
    }

    pub fn engine(&self, name: &str) -> Option<EngineHandle> {
        match self.registry.get(name) {
            Some(DataFixture::Engine(engine)) => Some(engine.clone()),
            _ => None,
        }
    }

    /// Remove a stored fixture
    pub fn destroy(&mut self, fixture: DataFixture) -> &mut Self {
        self.registry.destroy(&fixture);
        self
    }

    /// Raw connection and cursor on `engine`, closed when `f` returns
    pub fn dbapi_connect<T>(
        &self,
        engine: &EngineHandle,
        f: impl FnOnce(&mut dyn RawConnection, &mut dyn Cursor) -> Result<T>,
    ) -> Result<T> {
        scope::with_raw_connection(engine.as_ref(), f)
    }

    /// Connection on `engine`, closed when `f` returns
    pub fn connect<T>(
        &self,
        engine: &EngineHandle,
        f: impl FnOnce(&mut dyn Connection) -> Result<T>,
    ) -> Result<T> {
        scope::with_connection(engine.as_ref(), f)
    }

    /// Transaction on `conn` under this factory's policy
    pub fn begin_transaction<T>(
        &self,
        conn: &mut dyn Connection,
        f: impl FnOnce(&mut dyn Connection) -> Result<T>,
    ) -> Result<Option<T>> {
        scope::with_transaction(conn, self.transaction_policy, f)
    }
}
