use crate::db::DbPool;
use crate::storage::ImageStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub images: ImageStore,
}
