use std::sync::Arc;

use crate::{
    config::AuthConfig,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(orm: OrmConn, auth: AuthConfig) -> Self {
        let pool = orm.get_postgres_connection_pool().clone();
        Self {
            pool,
            orm,
            auth: Arc::new(auth),
        }
    }
}
