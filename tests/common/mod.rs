use tempfile::TempDir;
use tenant_crm::db::{DbPool, establish_connection_pool, run_migrations};
use tenant_crm::repository::DieselRepository;

/// Migrated SQLite database living in a temporary directory.
pub struct TestDb {
    pool: DbPool,
    _dir: TempDir,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(name);
        let pool = establish_connection_pool(path.to_str().expect("utf-8 path"))
            .expect("open test database");
        run_migrations(&pool).expect("run migrations");
        Self { pool, _dir: dir }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    #[allow(dead_code)]
    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}
