//! A tutoring session.
//!
//! Owns the session database, the configuration and the catalog, and ties
//! the provisioner, the query runner and the checker together. A session is
//! owned by exactly one caller; nothing in it is shared.

use tracing::info;

use crate::catalog::{Catalog, Exercise, Level};
use crate::config::Config;
use crate::db::{DatabaseClient, QueryResult, Schema, SqliteClient, StatementOutcome};
use crate::error::{Result, TutorError};
use crate::grading::{Checker, Verdict};
use crate::provision::{provision, SampleSchema};
use crate::query::{QueryRunner, QuerySource};

/// Number of rows shown per table when describing the schema.
const SAMPLE_ROWS: usize = 5;

/// Schema diagram plus a few rows of every table.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaOverview {
    pub schema: SampleSchema,
    pub structure: Schema,
    /// Table name and its first rows, in creation order.
    pub samples: Vec<(String, QueryResult)>,
}

/// A learner's session against one in-memory database.
pub struct TutorSession<C: DatabaseClient = SqliteClient> {
    client: C,
    config: Config,
    catalog: Catalog,
    schema: SampleSchema,
    runner: QueryRunner,
    checker: Checker,
}

impl TutorSession<SqliteClient> {
    /// Opens a session on a fresh in-memory database.
    ///
    /// Loads the configured catalog and the default sample schema.
    pub async fn open(config: Config) -> Result<Self> {
        let catalog = match &config.session.catalog {
            Some(path) => Catalog::load_from_file(path)?,
            None => Catalog::builtin(),
        };
        let client = SqliteClient::connect_in_memory()
            .await?
            .with_timeout(config.grading.query_timeout());

        Self::with_client(client, config, catalog).await
    }

    /// Closes the session database.
    pub async fn close(self) -> Result<()> {
        self.client.close().await
    }
}

impl<C: DatabaseClient> TutorSession<C> {
    /// Creates a session over an existing client and provisions the default
    /// schema into it.
    pub async fn with_client(mut client: C, config: Config, catalog: Catalog) -> Result<Self> {
        let schema = config.session.default_schema;
        provision(&mut client, schema).await?;

        let runner = QueryRunner::new(config.grading.mutations);
        let checker = Checker::new(runner, config.grading.options());

        Ok(Self {
            client,
            config,
            catalog,
            schema,
            runner,
            checker,
        })
    }

    /// The sample schema currently loaded.
    pub fn schema(&self) -> SampleSchema {
        self.schema
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Replaces the database contents with a sample schema.
    ///
    /// Reloading the current schema discards any changes the learner made.
    pub async fn load_schema(&mut self, schema: SampleSchema) -> Result<()> {
        provision(&mut self.client, schema).await?;
        self.schema = schema;
        Ok(())
    }

    /// Runs a free-form learner statement.
    pub async fn run_query(&mut self, sql: &str) -> Result<StatementOutcome> {
        let sql = non_empty(sql)?;
        self.runner
            .execute(&mut self.client, sql, QuerySource::Learner)
            .await
    }

    /// Grades a learner answer to a catalog exercise.
    ///
    /// Switches to the exercise's sample schema first when another one is
    /// loaded.
    pub async fn check_exercise(&mut self, level: Level, title: &str, sql: &str) -> Result<Verdict> {
        let sql = non_empty(sql)?;
        let exercise = self.catalog.find(level, title)?;
        let (exercise_schema, reference) = (exercise.schema, exercise.reference.clone());

        if exercise_schema != self.schema {
            info!(from = %self.schema, to = %exercise_schema, "switching schema for exercise");
            self.load_schema(exercise_schema).await?;
        }

        Ok(self.checker.check(&mut self.client, sql, &reference).await)
    }

    pub fn hint(&self, level: Level, title: &str) -> Result<&str> {
        Ok(&self.catalog.find(level, title)?.hint)
    }

    /// The exercise with its reference answer.
    pub fn solution(&self, level: Level, title: &str) -> Result<&Exercise> {
        self.catalog.find(level, title)
    }

    /// Describes the loaded schema with a few rows of every table.
    pub async fn describe_schema(&mut self) -> Result<SchemaOverview> {
        let structure = self.client.introspect_schema().await?;

        let mut samples = Vec::with_capacity(structure.tables.len());
        for table in &structure.tables {
            let sql = format!("SELECT * FROM {} LIMIT {SAMPLE_ROWS}", table.name);
            let rows = self
                .client
                .execute_query(&sql)
                .await?
                .into_rows()
                .ok_or_else(|| {
                    TutorError::internal(format!("sampling {} returned no result set", table.name))
                })?;
            samples.push((table.name.clone(), rows));
        }

        Ok(SchemaOverview {
            schema: self.schema,
            structure,
            samples,
        })
    }
}

fn non_empty(sql: &str) -> Result<&str> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        Err(TutorError::query("Please enter a SQL query first"))
    } else {
        Ok(trimmed)
    }
}
