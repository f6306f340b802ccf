use crate::error::ApiError;
use serde::{Deserialize, Serialize};

const MAX_ID_BYTES: usize = 50;

/// (course_id, course_material_id). Partitions the corpus; both sides
/// are opaque, non-empty, and bounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantKey {
    pub course_id: String,
    pub course_material_id: String,
}

impl TenantKey {
    pub fn new(course_id: impl Into<String>, course_material_id: impl Into<String>) -> Result<Self, ApiError> {
        let course_id = course_id.into();
        let course_material_id = course_material_id.into();
        validate_id(&course_id, "course_id")?;
        validate_id(&course_material_id, "course_material_id")?;
        Ok(Self {
            course_id,
            course_material_id,
        })
    }
}

pub fn validate_id(id: &str, field: &str) -> Result<(), ApiError> {
    if id.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    if id.len() > MAX_ID_BYTES {
        return Err(ApiError::BadRequest(format!(
            "{field} must be at most {MAX_ID_BYTES} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(TenantKey::new("", "m1").is_err());
        assert!(TenantKey::new("c1", "").is_err());
    }

    #[test]
    fn rejects_oversize() {
        let long = "x".repeat(51);
        assert!(TenantKey::new(long, "m1").is_err());
    }

    #[test]
    fn accepts_valid() {
        assert!(TenantKey::new("c1", "m1").is_ok());
    }
}
