use sqlx::{Connection, Executor};

use crate::DbResult;

const BOOTSTRAP: &str = "bootstrap";

/// Database every PostgreSQL cluster has, used to look for and create the target one
const MAINTENANCE_DATABASE: &str = "postgres";

/// SQLSTATE codes of a `CREATE DATABASE` that lost the race against another process
const DUPLICATE_DATABASE: &str = "42P04";
const UNIQUE_VIOLATION: &str = "23505";

/// Waits until the configured database exists.
///
/// With `bootstrap.create_database` set (and the process not read-only) a
/// missing database is created. Concurrent starters may all try; the losers
/// see the database created by the winner and carry on.
pub async fn ensure_database(config: &configuration::DatabaseConfig) -> DbResult<()> {
    let options = super::PostgresDBManager::connect_options(config)?;
    let Some(database_name) = options.get_database().map(str::to_string) else {
        // No database name: the server default for the user is used as is
        return Ok(());
    };
    let create = config.bootstrap.create_database && !config.read_only;
    let maintenance_options = options.database(MAINTENANCE_DATABASE);
    let mut conn = sqlx::PgConnection::connect_with(&maintenance_options).await?;

    loop {
        if database_exists(&mut conn, &database_name).await? {
            break;
        }
        if create {
            create_database(&mut conn, &database_name).await?;
            continue;
        }
        tracing::info!(
            target: BOOTSTRAP,
            "Waiting for database `{}` to be created",
            database_name
        );
        tokio::time::sleep(config.bootstrap.poll_interval()).await;
    }

    conn.close().await?;
    tracing::debug!(target: BOOTSTRAP, "Database `{}` is available", database_name);
    Ok(())
}

async fn database_exists(conn: &mut sqlx::PgConnection, database_name: &str) -> DbResult<bool> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1);")
            .bind(database_name)
            .fetch_one(&mut *conn)
            .await?;
    Ok(exists)
}

async fn create_database(conn: &mut sqlx::PgConnection, database_name: &str) -> DbResult<()> {
    // CREATE DATABASE takes no bind parameters and must not run in a transaction
    let statement = format!("CREATE DATABASE {};", quote_identifier(database_name));
    match conn.execute(statement.as_str()).await {
        Ok(_) => {
            tracing::info!(target: BOOTSTRAP, "Database `{}` created", database_name);
            Ok(())
        }
        Err(sqlx::Error::Database(err)) if is_creation_race(err.code().as_deref()) => {
            tracing::info!(
                target: BOOTSTRAP,
                "Database `{}` was created by another process",
                database_name
            );
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn is_creation_race(code: Option<&str>) -> bool {
    matches!(code, Some(DUPLICATE_DATABASE) | Some(UNIQUE_VIOLATION))
}

fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_creation_races_are_recognized() {
        assert!(is_creation_race(Some("42P04")));
        assert!(is_creation_race(Some("23505")));
        assert!(!is_creation_race(Some("42501")));
        assert!(!is_creation_race(None));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_identifier("ton_index"), "\"ton_index\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
