use crate::error::WorkflowResult;
use crate::progress::{ProgressEvent, ProgressSink};
use iris_abstraction::{Project, TrainingApi};
use tracing::{debug, info};

/// Destructively recreates the named project.
///
/// Lists all remote projects and takes the first exact name match; if one
/// exists it is deleted along with all of its tags, images, and iterations.
/// A fresh project with the same name is then created unconditionally, so
/// running the workflow twice leaves one live project, not two.
pub async fn recreate_project(
    api: &dyn TrainingApi,
    name: &str,
    description: &str,
    progress: &dyn ProgressSink,
) -> WorkflowResult<Project> {
    progress.on_event(ProgressEvent::ProjectLookup { name: name.to_string() });
    let projects = api.list_projects().await?;

    let matches = projects.iter().filter(|p| p.name == name).count();
    if matches > 1 {
        // Service order decides which duplicate wins.
        debug!(name = %name, matches, "Multiple projects share this name; deleting the first");
    }

    if let Some(existing) = projects.into_iter().find(|p| p.name == name) {
        info!(name = %name, id = %existing.id, "Project exists, deleting");
        progress.on_event(ProgressEvent::ProjectRemoved { name: name.to_string() });
        api.delete_project(&existing.id).await?;
    }

    progress.on_event(ProgressEvent::ProjectCreated { name: name.to_string() });
    Ok(api.create_project(name, description).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryProgressSink;
    use iris_client::MockTrainingApi;

    #[tokio::test]
    async fn test_recreate_deletes_existing_project_first() {
        let api = MockTrainingApi::new();
        let old = api.add_project("TeamDemo", "stale");
        let progress = MemoryProgressSink::new();

        let fresh = recreate_project(&api, "TeamDemo", "fresh", &progress).await.unwrap();

        assert_eq!(api.deleted_projects(), vec![old.id.clone()]);
        assert_ne!(fresh.id, old.id);
        assert_eq!(api.projects().len(), 1);
        assert_eq!(api.projects()[0].description, "fresh");
    }

    #[tokio::test]
    async fn test_recreate_skips_delete_when_absent() {
        let api = MockTrainingApi::new();
        api.add_project("Unrelated", "");
        let progress = MemoryProgressSink::new();

        let project = recreate_project(&api, "TeamDemo", "demo", &progress).await.unwrap();

        assert!(api.deleted_projects().is_empty());
        assert_eq!(project.name, "TeamDemo");
        assert_eq!(api.projects().len(), 2);
        assert!(!progress
            .events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::ProjectRemoved { .. })));
    }

    #[tokio::test]
    async fn test_recreate_is_idempotent_across_runs() {
        let api = MockTrainingApi::new();
        let progress = MemoryProgressSink::new();

        recreate_project(&api, "TeamDemo", "demo", &progress).await.unwrap();
        recreate_project(&api, "TeamDemo", "demo", &progress).await.unwrap();

        // Two runs leave one live project.
        assert_eq!(api.projects().len(), 1);
        assert_eq!(api.deleted_projects().len(), 1);
    }
}
