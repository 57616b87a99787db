pub mod employees;
pub mod sample;

use std::path::Path;

use log::{debug, info, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::errors::AppError;

pub const TABLE_EMPLOYEES: &str = "Employees";
pub const INDEX_EMPLOYEES: &str = "PK_Employees";

pub const SQL_DROP_EMPLOYEES: &str = "DROP TABLE Employees";

pub const SQL_CREATE_EMPLOYEES_TABLE: &str = r#"
    CREATE TABLE Employees (
        EmployeeID  INTEGER NOT NULL,
        LastName    NVARCHAR(20) NOT NULL,
        FirstName   NVARCHAR(10) NOT NULL,
        Address     NVARCHAR(60),
        City        NVARCHAR(15),
        Region      NVARCHAR(15),
        PostalCode  NVARCHAR(10),
        Country     NVARCHAR(15),
        HomePhone   NVARCHAR(24),
        Photo       BLOB,
        UpdatedAt   DATETIME
    )
"#;

pub const SQL_CREATE_EMPLOYEES_INDEX: &str =
    "CREATE UNIQUE INDEX PK_Employees ON Employees (EmployeeID)";

/// Opens the database file if it exists, otherwise creates it and seeds the
/// sample employees.
pub async fn init_database(config: &AppConfig) -> Result<SqlitePool, AppError> {
    init_database_seeded_with(config, &sample::SAMPLE_EMPLOYEES).await
}

async fn init_database_seeded_with(
    config: &AppConfig,
    employees: &[sample::SampleEmployee],
) -> Result<SqlitePool, AppError> {
    let path = config.database_path.as_path();

    if path.exists() {
        info!("Opening existing database {}", path.display());
        return open_database(path).await;
    }

    info!("Database {} not found, creating it", path.display());
    let pool = create_database(path).await?;

    if let Err(err) = sample::insert_sample_employees(&pool, employees, config.photo_dir.as_deref()).await {
        // Leave nothing behind so the next start seeds again.
        pool.close().await;
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove {} after seeding error: {}", path.display(), remove_err);
        }
        return Err(err);
    }

    Ok(pool)
}

/// Creates a fresh database file with the Employees table and its index.
pub async fn create_database(path: &Path) -> Result<SqlitePool, AppError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Deleted existing database {}", path.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(AppError::InternalServerError(format!(
                "Failed to delete {}: {}",
                path.display(),
                err
            )))
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = connect(options)
        .await
        .map_err(AppError::database("Create database"))?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Connects to an existing database file. Never creates one.
pub async fn open_database(path: &Path) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(false);
    connect(options)
        .await
        .map_err(AppError::database("Initialize database"))
}

/// Drops any previous Employees table and creates the table and its index.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), AppError> {
    if let Err(err) = execute_sql(pool, SQL_DROP_EMPLOYEES).await {
        debug!("Ignoring drop of {}: {}", TABLE_EMPLOYEES, err);
    }

    execute_sql(pool, SQL_CREATE_EMPLOYEES_TABLE)
        .await
        .map_err(AppError::database("Create Employees table"))?;

    // The sample data is small, so the index is created before inserting it.
    execute_sql(pool, SQL_CREATE_EMPLOYEES_INDEX)
        .await
        .map_err(AppError::database("Create Employees index"))?;

    info!("Created table {} with index {}", TABLE_EMPLOYEES, INDEX_EMPLOYEES);
    Ok(())
}

/// Executes a statement that returns no rows.
pub async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<(), sqlx::Error> {
    sqlx::query(sql).execute(pool).await.map(|_| ())
}

// One connection, held for the lifetime of the process.
async fn connect(options: SqliteConnectOptions) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

#[cfg(test)]
pub async fn connect_in_memory() -> SqlitePool {
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:").expect("memory url");
    connect(options).await.expect("in-memory database")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::employees;

    fn config_for(dir: &Path) -> AppConfig {
        AppConfig {
            database_path: dir.join("northwind.db"),
            bind_address: "127.0.0.1:0".to_string(),
            photo_dir: None,
            max_photo_bytes: 102400,
        }
    }

    #[tokio::test]
    async fn init_creates_and_seeds_missing_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_for(dir.path());

        let pool = init_database(&config).await.expect("init");
        assert!(config.database_path.exists());

        let names = employees::populate_employee_names(&pool).await.expect("names");
        assert_eq!(names.len(), sample::SAMPLE_EMPLOYEES.len());
        pool.close().await;
    }

    #[tokio::test]
    async fn init_opens_existing_database_without_reseeding() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_for(dir.path());

        let pool = init_database(&config).await.expect("first init");
        let update = crate::models::employee::EmployeeUpdate {
            city: Some("Bellevue".to_string()),
            ..Default::default()
        };
        employees::save_employee_info(&pool, 1, &update).await.expect("save");
        pool.close().await;

        let pool = init_database(&config).await.expect("second init");
        let info = employees::load_employee_info(&pool, 1)
            .await
            .expect("load")
            .expect("employee 1");
        assert_eq!(info.city.as_deref(), Some("Bellevue"));
        let names = employees::populate_employee_names(&pool).await.expect("names");
        assert_eq!(names.len(), sample::SAMPLE_EMPLOYEES.len());
        pool.close().await;
    }

    #[tokio::test]
    async fn failed_seed_removes_file_and_next_init_seeds_again() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_for(dir.path());
        let clashing = [sample::SAMPLE_EMPLOYEES[0], sample::SAMPLE_EMPLOYEES[0]];

        let err = init_database_seeded_with(&config, &clashing).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(!config.database_path.exists());

        let pool = init_database(&config).await.expect("second init");
        let names = employees::populate_employee_names(&pool).await.expect("names");
        assert_eq!(names.len(), 9);
        pool.close().await;
    }

    #[tokio::test]
    async fn open_database_does_not_create_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.db");
        let err = open_database(&path).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn create_database_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("northwind.db");
        std::fs::write(&path, b"not a database").expect("write");

        let pool = create_database(&path).await.expect("create");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Employees")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn employee_id_is_unique() {
        let pool = connect_in_memory().await;
        create_schema(&pool).await.expect("schema");
        execute_sql(&pool, "INSERT INTO Employees (EmployeeID, LastName, FirstName) VALUES (1, 'A', 'B')")
            .await
            .expect("first insert");
        let duplicate =
            execute_sql(&pool, "INSERT INTO Employees (EmployeeID, LastName, FirstName) VALUES (1, 'C', 'D')").await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn create_schema_can_run_twice() {
        let pool = connect_in_memory().await;
        create_schema(&pool).await.expect("first");
        create_schema(&pool).await.expect("second");
    }
}
