use std::sync::Arc;
use std::time::Duration;

use kyc_checklist::models::{IssueAction, IssueCategory, Statistics};
use kyc_checklist::repository::{Repository, RepositoryEvent};
use kyc_checklist::resource::{AsyncResource, FetchError, FetchStatus};
use tokio::sync::RwLock;

fn statistics_resource(repo: &Arc<RwLock<Repository>>) -> AsyncResource<Statistics> {
    let repo = Arc::clone(repo);
    AsyncResource::new(move || {
        let repo = Arc::clone(&repo);
        async move { Ok::<_, FetchError>(repo.read().await.statistics()) }
    })
}

#[tokio::test]
async fn test_statistics_resource_follows_repository_changes() {
    let repo = Arc::new(RwLock::new(Repository::builtin().unwrap()));
    let events = repo.read().await.subscribe();

    let resource = statistics_resource(&repo);
    assert_eq!(resource.load().await, FetchStatus::Success);
    assert_eq!(resource.data().unwrap().kyc_quality, 33);

    let mut rx = resource.subscribe();
    rx.borrow_and_update();
    let stop = resource.refresh_on(events);

    repo.write()
        .await
        .apply_action(1, IssueAction::Approve)
        .unwrap()
        .unwrap();

    let refreshed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            rx.changed().await.unwrap();
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.status == FetchStatus::Success {
                break snapshot;
            }
        }
    })
    .await
    .expect("resource was not refreshed");

    assert_eq!(refreshed.data.unwrap().kyc_quality, 40);
    stop.cancel();
}

#[tokio::test]
async fn test_events_describe_each_mutation() {
    let mut repo = Repository::builtin().unwrap();
    let mut rx = repo.subscribe();

    repo.apply_action(2, IssueAction::Reject).unwrap();
    assert!(repo.delete_issue(3).unwrap());
    assert!(!repo.delete_issue(3).unwrap());

    let first = rx.try_recv().unwrap();
    assert!(matches!(first, RepositoryEvent::IssueUpdated { id: 2, revision: 1, .. }));
    let second = rx.try_recv().unwrap();
    assert!(matches!(second, RepositoryEvent::IssueDeleted { id: 3, revision: 2, .. }));
    assert!(second.touches_issues());
    assert!(rx.try_recv().is_err());
    assert_eq!(repo.revision(), 2);
}

#[tokio::test]
async fn test_category_resource_reports_empty_after_deletes() {
    let repo = Arc::new(RwLock::new(Repository::builtin().unwrap()));
    let source_repo = Arc::clone(&repo);
    let resource = AsyncResource::new(move || {
        let repo = Arc::clone(&source_repo);
        async move {
            let issues = repo.read().await.issues_by_category(IssueCategory::Corr)?;
            Ok::<_, FetchError>(issues)
        }
    });

    assert_eq!(resource.load().await, FetchStatus::Success);

    let ids: Vec<u32> = resource.data().unwrap().iter().map(|i| i.id).collect();
    {
        let mut repo = repo.write().await;
        for id in ids {
            assert!(repo.delete_issue(id).unwrap());
        }
    }

    assert_eq!(resource.retry().await, FetchStatus::Empty);
    assert_eq!(resource.data(), Some(Vec::new()));
}
