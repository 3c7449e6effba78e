use iris_abstraction::{ApiError, ProjectId, TagId, TrainingApi};
use std::collections::HashMap;
use tracing::debug;

/// Map from tag name to the id the service assigned on first creation.
///
/// `get_or_create` issues at most one remote tag creation per distinct name
/// for the registry's lifetime; entries are never removed or replaced, so a
/// tag id is stable once resolved.
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: HashMap<String, TagId>,
}

impl TagRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The id for a tag name, if it has already been created.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TagId> {
        self.tags.get(name)
    }

    /// Number of distinct tags resolved so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Resolves a tag name to its remote id, creating the tag on the service
    /// the first time the name is seen.
    pub async fn get_or_create(
        &mut self,
        api: &dyn TrainingApi,
        project_id: &ProjectId,
        name: &str,
    ) -> Result<TagId, ApiError> {
        if let Some(id) = self.tags.get(name) {
            return Ok(id.clone());
        }
        let tag = api.create_tag(project_id, name).await?;
        debug!(name = %name, id = %tag.id, "Created tag");
        self.tags.insert(name.to_string(), tag.id.clone());
        Ok(tag.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_client::MockTrainingApi;

    #[tokio::test]
    async fn test_repeated_names_create_one_remote_tag() {
        let api = MockTrainingApi::new();
        let project = api.add_project("demo", "");
        let mut registry = TagRegistry::new();

        let first = registry.get_or_create(&api, &project.id, "cat").await.unwrap();
        let second = registry.get_or_create(&api, &project.id, "cat").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.created_tags().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_names_each_get_their_own_id() {
        let api = MockTrainingApi::new();
        let project = api.add_project("demo", "");
        let mut registry = TagRegistry::new();

        let cat = registry.get_or_create(&api, &project.id, "cat").await.unwrap();
        let dog = registry.get_or_create(&api, &project.id, "dog").await.unwrap();

        assert_ne!(cat, dog);
        assert_eq!(api.created_tags().len(), 2);
        assert_eq!(registry.get("dog"), Some(&dog));
    }
}
