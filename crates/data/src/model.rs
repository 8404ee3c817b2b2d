//! Database fixture models

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

pub type ServerRef = Arc<RwLock<Server>>;
pub type DatabaseRef = Arc<RwLock<DataBase>>;

/// Port used when a server is created without one
pub const DEFAULT_PORT: u16 = 3306;

/// A driver API used to reach servers of one dialect, e.g. `pymysql` for `mysql`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbApi {
    pub name: String,
    #[serde(rename = "type")]
    pub dialect: String,
}

impl DbApi {
    pub fn new(name: impl Into<String>, dialect: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dialect: dialect.into(),
        }
    }
}

/// A database server
#[derive(Debug)]
pub struct Server {
    pub dialect: String,
    pub ip: String,
    pub port: u16,
    api: Option<Arc<DbApi>>,
    databases: IndexMap<String, Weak<RwLock<DataBase>>>,
}

impl Server {
    pub fn new(dialect: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            ip: ip.into(),
            port: DEFAULT_PORT,
            api: None,
            databases: IndexMap::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn shared(self) -> ServerRef {
        Arc::new(RwLock::new(self))
    }

    /// Driver API attached to this server, if any
    pub fn api(&self) -> Option<&Arc<DbApi>> {
        self.api.as_ref()
    }

    pub fn set_api(&mut self, api: Arc<DbApi>) {
        self.api = Some(api);
    }

    /// A database attached to this server by name
    pub fn database(&self, name: &str) -> Option<DatabaseRef> {
        self.databases.get(name).and_then(Weak::upgrade)
    }

    /// Names of attached databases that are still alive
    pub fn database_names(&self) -> Vec<String> {
        self.databases
            .iter()
            .filter(|(_, db)| db.strong_count() > 0)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub(crate) fn attach_database(&mut self, database: &DatabaseRef) {
        let name = database.read().name.clone();
        self.databases.insert(name, Arc::downgrade(database));
    }
}

/// A database living on one server
#[derive(Debug)]
pub struct DataBase {
    pub name: String,
    server: Option<ServerRef>,
}

impl DataBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: None,
        }
    }

    pub fn shared(self) -> DatabaseRef {
        Arc::new(RwLock::new(self))
    }

    pub fn server(&self) -> Option<&ServerRef> {
        self.server.as_ref()
    }

    pub(crate) fn set_server(&mut self, server: ServerRef) {
        self.server = Some(server);
    }
}

/// Credentials for connecting to a database
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbUser {
    pub username: String,
    pub password: String,
}

impl DbUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for DbUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbUser")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = Server::new("mysql", "10.18.200.72");
        assert_eq!(server.port, DEFAULT_PORT);
        assert!(server.api().is_none());
        assert_eq!(Server::new("postgresql", "db").with_port(5432).port, 5432);
    }

    #[test]
    fn test_attached_database_is_weak() {
        let server = Server::new("mysql", "10.18.200.72").shared();
        let db = DataBase::new("DCS_DataCenter").shared();
        server.write().attach_database(&db);

        assert!(server.read().database("DCS_DataCenter").is_some());
        assert_eq!(server.read().database_names(), vec!["DCS_DataCenter"]);

        drop(db);
        assert!(server.read().database("DCS_DataCenter").is_none());
        assert!(server.read().database_names().is_empty());
    }

    #[test]
    fn test_user_debug_hides_password() {
        let user = DbUser::new("fps", "s3cret");
        let printed = format!("{:?}", user);
        assert!(printed.contains("fps"));
        assert!(!printed.contains("s3cret"));
    }
}
