use crate::domain::TenantKey;
use crate::keyed_lock::KeyedLockMap;

/// Serializes ingestion and cleanup operations on the same tenant key,
/// so two concurrent `build_index`/`cleanup` calls for the same
/// (course_id, course_material_id) never interleave.
pub struct TenantLockMap {
    inner: KeyedLockMap<TenantKey>,
}

impl TenantLockMap {
    pub fn new() -> Self {
        Self {
            inner: KeyedLockMap::new(),
        }
    }

    pub async fn acquire(&self, tenant: &TenantKey) -> tokio::sync::OwnedMutexGuard<()> {
        self.inner.acquire(tenant.clone()).await
    }

    pub fn sweep_idle(&self) {
        self.inner.sweep_idle();
    }
}

impl Default for TenantLockMap {
    fn default() -> Self {
        Self::new()
    }
}
