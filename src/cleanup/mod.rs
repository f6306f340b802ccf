use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::FilterSpec;
use crate::error::ApiError;
use crate::memory_store::MemoryStore;
use crate::vector_store::VectorStore;

#[derive(Debug, Clone, Default)]
pub struct CleanupFlags {
    pub delete_files: bool,
    pub delete_vectors: bool,
    pub delete_memory: bool,
    /// When set, per-operation failures are recorded but do not abort
    /// the remaining operations, and overall success is still reported
    /// as true.
    pub force_cleanup: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum OperationType {
    DeleteFiles,
    DeleteVectors,
    DeleteMemory,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CleanupOperation {
    pub operation_type: OperationType,
    pub target: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CleanupReport {
    pub success: bool,
    pub files_deleted: u64,
    pub vectors_deleted: u64,
    pub directories_cleaned: u64,
    pub operations: Vec<CleanupOperation>,
}

/// Cascade-deletes all artifacts associated with a course or a
/// specific course material. Per-conversation cleanup is not supported
/// here — memory is keyed per conversation, not per tenant.
pub struct CleanupCoordinator {
    vector_store: Arc<dyn VectorStore>,
    memory_store: Arc<dyn MemoryStore>,
}

impl CleanupCoordinator {
    pub fn new(vector_store: Arc<dyn VectorStore>, memory_store: Arc<dyn MemoryStore>) -> Self {
        Self {
            vector_store,
            memory_store,
        }
    }

    pub async fn cleanup(
        &self,
        collection: &str,
        course_id: &str,
        course_material_id: Option<&str>,
        flags: CleanupFlags,
    ) -> CleanupReport {
        let mut report = CleanupReport::default();

        let vector_filter = match course_material_id {
            Some(material_id) => FilterSpec::ByMaterial(material_id.to_string()),
            None => FilterSpec::ByCourse(course_id.to_string()),
        };

        if flags.delete_vectors {
            let target = describe_target(course_id, course_material_id);
            match self.vector_store.delete_by_filter(collection, &vector_filter).await {
                Ok(deleted) => {
                    report.vectors_deleted += deleted;
                    report.operations.push(CleanupOperation {
                        operation_type: OperationType::DeleteVectors,
                        target: target.clone(),
                        success: true,
                        message: format!("deleted {deleted} vectors"),
                    });
                }
                Err(e) => {
                    report.operations.push(CleanupOperation {
                        operation_type: OperationType::DeleteVectors,
                        target,
                        success: false,
                        message: e.to_string(),
                    });
                    if !flags.force_cleanup {
                        return self.finalize(report, false);
                    }
                }
            }
        }

        if flags.delete_files {
            // Filesystem cleanup is owned by the upload-path collaborator;
            // this coordinator only records that the step was requested
            // and skipped, since it holds no filesystem layout of its own.
            report.operations.push(CleanupOperation {
                operation_type: OperationType::DeleteFiles,
                target: describe_target(course_id, course_material_id),
                success: true,
                message: "file cleanup delegated to upload-path collaborator".to_string(),
            });
        }

        if flags.delete_memory {
            warn!(
                "delete_memory requested on a tenant-scoped cleanup, but memory is keyed per \
                 conversation; no conversation_id is available here, so this flag is a no-op"
            );
            report.operations.push(CleanupOperation {
                operation_type: OperationType::DeleteMemory,
                target: describe_target(course_id, course_material_id),
                success: true,
                message: "conversation memory cleanup is per-conversation; nothing to do here".to_string(),
            });
        }

        let all_succeeded = report.operations.iter().all(|op| op.success);
        self.finalize(report, all_succeeded || flags.force_cleanup)
    }

    /// Deletes a single conversation's memory record. Separate entry
    /// point from `cleanup` because conversation_id, not a tenant key,
    /// is the addressing scheme for the memory store.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<bool, ApiError> {
        self.memory_store.delete(conversation_id).await
    }

    fn finalize(&self, mut report: CleanupReport, success: bool) -> CleanupReport {
        report.success = success;
        info!(
            success,
            vectors_deleted = report.vectors_deleted,
            operations = report.operations.len(),
            "cleanup complete"
        );
        report
    }
}

fn describe_target(course_id: &str, course_material_id: Option<&str>) -> String {
    match course_material_id {
        Some(material_id) => format!("course={course_id} material={material_id}"),
        None => format!("course={course_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MockMemoryStore;
    use crate::vector_store::MockVectorStore;

    #[tokio::test]
    async fn idempotent_delete_reports_zero_on_second_call() {
        let mut vector_store = MockVectorStore::new();
        vector_store.expect_delete_by_filter().returning(|_, _| Ok(5));
        vector_store.expect_delete_by_filter().returning(|_, _| Ok(0));

        let memory_store = MockMemoryStore::new();
        let coordinator = CleanupCoordinator::new(Arc::new(vector_store), Arc::new(memory_store));

        let flags = CleanupFlags {
            delete_vectors: true,
            ..Default::default()
        };

        let first = coordinator.cleanup("default", "c1", Some("m1"), flags.clone()).await;
        assert!(first.success);
        assert_eq!(first.vectors_deleted, 5);

        let second = coordinator.cleanup("default", "c1", Some("m1"), flags).await;
        assert!(second.success);
        assert_eq!(second.vectors_deleted, 0);
    }

    #[tokio::test]
    async fn short_circuits_without_force_cleanup() {
        let mut vector_store = MockVectorStore::new();
        vector_store
            .expect_delete_by_filter()
            .returning(|_, _| Err(ApiError::store_unavailable("down")));

        let memory_store = MockMemoryStore::new();
        let coordinator = CleanupCoordinator::new(Arc::new(vector_store), Arc::new(memory_store));

        let flags = CleanupFlags {
            delete_vectors: true,
            force_cleanup: false,
            ..Default::default()
        };

        let report = coordinator.cleanup("default", "c1", Some("m1"), flags).await;
        assert!(!report.success);
    }

    #[tokio::test]
    async fn force_cleanup_reports_success_despite_failures() {
        let mut vector_store = MockVectorStore::new();
        vector_store
            .expect_delete_by_filter()
            .returning(|_, _| Err(ApiError::store_unavailable("down")));

        let memory_store = MockMemoryStore::new();
        let coordinator = CleanupCoordinator::new(Arc::new(vector_store), Arc::new(memory_store));

        let flags = CleanupFlags {
            delete_vectors: true,
            force_cleanup: true,
            ..Default::default()
        };

        let report = coordinator.cleanup("default", "c1", Some("m1"), flags).await;
        assert!(report.success);
        assert!(!report.operations[0].success);
    }

    #[tokio::test]
    async fn uses_by_material_filter_when_material_present() {
        let mut vector_store = MockVectorStore::new();
        vector_store.expect_delete_by_filter().returning(|_, filter| {
            assert_eq!(*filter, FilterSpec::ByMaterial("m1".to_string()));
            Ok(3)
        });

        let memory_store = MockMemoryStore::new();
        let coordinator = CleanupCoordinator::new(Arc::new(vector_store), Arc::new(memory_store));

        let flags = CleanupFlags {
            delete_vectors: true,
            ..Default::default()
        };
        coordinator.cleanup("default", "c1", Some("m1"), flags).await;
    }

    #[tokio::test]
    async fn uses_by_course_filter_when_material_absent() {
        let mut vector_store = MockVectorStore::new();
        vector_store.expect_delete_by_filter().returning(|_, filter| {
            assert_eq!(*filter, FilterSpec::ByCourse("c1".to_string()));
            Ok(7)
        });

        let memory_store = MockMemoryStore::new();
        let coordinator = CleanupCoordinator::new(Arc::new(vector_store), Arc::new(memory_store));

        let flags = CleanupFlags {
            delete_vectors: true,
            ..Default::default()
        };
        coordinator.cleanup("default", "c1", None, flags).await;
    }
}
