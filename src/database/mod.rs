use derive_new::new;
use serde::Deserialize;
use snafu::{Location, ResultExt as _, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth;
use surrealdb::opt::{IntoQuery, QueryResult};
use surrealdb::Surreal;

/// Macros for defining queries on a store.
pub mod macros;

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

const SETUP: &str = include_str!("schema.surql");

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DatabaseError {
    #[snafu(display("failed to query the database at {location}: {source}"))]
    DatabaseQuery {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to deserialize the database response at {location}: {source}"))]
    DatabaseDeserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("cannot connect to the database `{endpoint}` at {location}: {source}"))]
    DatabaseConnection {
        endpoint: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Which storage backend the server runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process-local maps, lost on restart.
    Memory,
    #[default]
    Surreal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(rename = "database_backend", default)]
    pub backend: Backend,
    /// Anything accepted by `surrealdb::engine::any::connect`, e.g. `mem://` or `ws://localhost:8000`.
    #[serde(rename = "surreal_endpoint", default = "default_endpoint")]
    pub endpoint: String,
    #[serde(rename = "surreal_namespace", default = "default_name")]
    pub namespace: String,
    #[serde(rename = "surreal_database", default = "default_name")]
    pub database: String,
    #[serde(rename = "surreal_username", default)]
    pub username: Option<String>,
    #[serde(rename = "surreal_password", default)]
    pub password: Option<String>,
}

fn default_endpoint() -> String {
    "mem://".to_string()
}

fn default_name() -> String {
    "adboard".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            endpoint: default_endpoint(),
            namespace: default_name(),
            database: default_name(),
            username: None,
            password: None,
        }
    }
}

impl DatabaseConfig {
    /// Connects to the configured endpoint, signs in when credentials are given, selects the
    /// namespace and database, and defines the schema.
    pub async fn connect(&self) -> Result<Database> {
        let endpoint = self.endpoint.as_str();

        let db = surrealdb::engine::any::connect(endpoint)
            .await
            .context(DatabaseConnectionSnafu { endpoint })?;

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            db.signin(auth::Root { username, password })
                .await
                .context(DatabaseConnectionSnafu { endpoint })?;
        }

        db.use_ns(&self.namespace)
            .use_db(&self.database)
            .await
            .context(DatabaseConnectionSnafu { endpoint })?;

        let database = Database::new(db);
        database.sql(SETUP).execute().await?;

        tracing::info!(endpoint, namespace = %self.namespace, database = %self.database, "connected to database");

        Ok(database)
    }
}

/// Represents a database wrapper.
#[derive(Debug, Clone, new)]
pub struct Database {
    database: Surreal<Any>,
}

impl Database {
    /// Create a builder to execute arbitrary SQL code on the database.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let ads: Vec<Ad> = db.sql("SELECT * FROM ads WHERE views_count > $views")
    ///     .bind(("views", 100))
    ///     .fetch()
    ///     .await?;
    /// ```
    pub fn sql(&self, query: impl IntoQuery) -> Query<'_> {
        let query = self.database.query(query);
        Query { query }
    }
}

impl std::ops::Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.database
    }
}

#[derive(Debug)]
pub struct Query<'a> {
    query: surrealdb::method::Query<'a, Any>,
}

impl Query<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Run every statement and fail on the first statement error, discarding results.
    pub async fn execute(self) -> Result<()> {
        let response = self.query.await.context(DatabaseQuerySnafu)?;
        response.check().context(DatabaseQuerySnafu)?;
        Ok(())
    }

    /// Run the query and deserialize the result of its first statement.
    pub async fn fetch<T: serde::de::DeserializeOwned>(self) -> Result<T>
    where
        usize: QueryResult<T>,
    {
        let mut statements = self.query.await.context(DatabaseQuerySnafu)?;
        let result = statements.take::<T>(0).context(DatabaseDeserializeSnafu)?;
        Ok(result)
    }
}
