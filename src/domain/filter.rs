use serde::{Deserialize, Serialize};

/// The intended metadata constraint on retrieval, derived from a
/// `ChatRequest` at entry. If both ids are supplied, `BY_COURSE` wins
/// and the caller is expected to log the tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterSpec {
    None,
    ByCourse(String),
    ByMaterial(String),
}

impl FilterSpec {
    /// Derive from optional course/material ids, per the tie-break rule.
    /// Returns the derived filter and whether a tie-break actually occurred.
    pub fn derive(course_id: Option<&str>, course_material_id: Option<&str>) -> (Self, bool) {
        match (course_id, course_material_id) {
            (Some(c), Some(_)) if !c.is_empty() => (Self::ByCourse(c.to_string()), true),
            (Some(c), None) if !c.is_empty() => (Self::ByCourse(c.to_string()), false),
            (None, Some(m)) if !m.is_empty() => (Self::ByMaterial(m.to_string()), false),
            (Some(c), Some(m)) if c.is_empty() && !m.is_empty() => {
                (Self::ByMaterial(m.to_string()), false)
            }
            _ => (Self::None, false),
        }
    }

    /// The contract-defined human-readable description of this filter,
    /// exposed to callers as `filter_info`.
    pub fn describe(&self) -> String {
        match self {
            FilterSpec::ByCourse(c) => format!("course_id = {c} (优先使用)"),
            FilterSpec::ByMaterial(m) => format!("course_material_id = {m}"),
            FilterSpec::None => "无过滤条件，搜索全部文档".to_string(),
        }
    }

    /// `describe()` without the tie-break suffix, used when course_id
    /// was the only id supplied (no tie to break).
    pub fn describe_plain(&self) -> String {
        match self {
            FilterSpec::ByCourse(c) => format!("course_id = {c}"),
            FilterSpec::ByMaterial(m) => format!("course_material_id = {m}"),
            FilterSpec::None => "无过滤条件，搜索全部文档".to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FilterSpec::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_break_prefers_course() {
        let (spec, tie) = FilterSpec::derive(Some("c1"), Some("m2"));
        assert_eq!(spec, FilterSpec::ByCourse("c1".to_string()));
        assert!(tie);
        assert!(spec.describe().starts_with("course_id = c1"));
    }

    #[test]
    fn course_only() {
        let (spec, tie) = FilterSpec::derive(Some("c1"), None);
        assert_eq!(spec, FilterSpec::ByCourse("c1".to_string()));
        assert!(!tie);
        assert_eq!(spec.describe_plain(), "course_id = c1");
    }

    #[test]
    fn material_only() {
        let (spec, _) = FilterSpec::derive(None, Some("m1"));
        assert_eq!(spec, FilterSpec::ByMaterial("m1".to_string()));
    }

    #[test]
    fn neither() {
        let (spec, _) = FilterSpec::derive(None, None);
        assert_eq!(spec, FilterSpec::None);
        assert_eq!(spec.describe(), "无过滤条件，搜索全部文档");
    }
}
