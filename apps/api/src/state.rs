use viajes_db::Database;

/// Shared handler state. `Database` is a pool handle, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}
