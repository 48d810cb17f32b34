use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashSet;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

#[derive(Debug)]
struct Migration {
    version: &'static str,
    name: &'static str,
    script: &'static str,
}

/// Ordered schema history. Append only; versions are recorded in the
/// `migration` table and never re-applied.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001",
        name: "user table",
        script: "
            DEFINE TABLE OVERWRITE user SCHEMAFULL;
            DEFINE FIELD OVERWRITE email ON user TYPE string ASSERT $value != '';
            DEFINE FIELD OVERWRITE name ON user TYPE string;
            DEFINE FIELD OVERWRITE password_hash ON user TYPE string;
            DEFINE FIELD OVERWRITE is_active ON user TYPE bool DEFAULT true;
            DEFINE FIELD OVERWRITE is_staff ON user TYPE bool DEFAULT false;
            DEFINE FIELD OVERWRITE is_superuser ON user TYPE bool DEFAULT false;
            DEFINE FIELD OVERWRITE created_at ON user TYPE datetime DEFAULT time::now();
            DEFINE INDEX OVERWRITE user_email_idx ON user FIELDS email UNIQUE;
        ",
    },
];

#[derive(Debug)]
pub(crate) struct MigrationRunner {
    db: Surreal<Any>,
}

impl MigrationRunner {
    #[must_use]
    pub(crate) const fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Applies pending migrations in order and returns the versions applied
    /// during this run. Re-running against an up-to-date schema is a no-op.
    pub(crate) async fn run(&self) -> Result<Vec<String>, DatabaseError> {
        self.ensure_ledger().await?;

        let recorded = self.applied_versions().await?;
        let mut applied = Vec::new();

        for migration in MIGRATIONS {
            if recorded.contains(migration.version) {
                continue;
            }
            self.apply(migration).await?;
            applied.push(migration.version.to_owned());
        }

        Ok(applied)
    }

    async fn ensure_ledger(&self) -> Result<(), DatabaseError> {
        let _ = self
            .db
            .query(
                "DEFINE TABLE OVERWRITE migration SCHEMAFULL;
                 DEFINE FIELD OVERWRITE version ON migration TYPE string;
                 DEFINE FIELD OVERWRITE name ON migration TYPE string;
                 DEFINE FIELD OVERWRITE applied_at ON migration TYPE datetime DEFAULT time::now();",
            )
            .await
            .context("Defining migration ledger")?;
        Ok(())
    }

    async fn applied_versions(&self) -> Result<FxHashSet<String>, DatabaseError> {
        let versions = self
            .db
            .query("SELECT VALUE version FROM migration")
            .await
            .context("Loading applied migrations")?
            .take::<Vec<String>>(0)
            .context("Parsing applied migrations")?;

        Ok(versions.into_iter().collect())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DatabaseError> {
        let query = format!(
            "BEGIN TRANSACTION;
            {}
            CREATE migration SET version = $version, name = $name;
            COMMIT TRANSACTION;",
            migration.script,
        );

        let _ = self
            .db
            .query(&query)
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await
            .context(format!("SQL execution failed at migration {}", migration.version))?;

        Ok(())
    }
}
