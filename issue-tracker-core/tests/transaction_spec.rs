use speculate2::speculate;

speculate! {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use issue_tracker_core::db::{
        issues, CollectionPath, DocPath, Document, DocumentStore, MemoryStore, Patch, StoreError,
        WriteBatch, MAX_TRANSACTION_ATTEMPTS, RESOLUTIONS,
    };
    use issue_tracker_core::models::*;
    use issue_tracker_core::{Database, Error};
    use tokio_test::block_on;

    /// Lands a competing write on a document just before a commit reaches the
    /// real store, so the commit's precondition on that document fails.
    struct ContendedStore {
        inner: MemoryStore,
        target: Mutex<Option<DocPath>>,
        rivals_left: AtomicUsize,
        commits: AtomicUsize,
    }

    impl ContendedStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                target: Mutex::new(None),
                rivals_left: AtomicUsize::new(0),
                commits: AtomicUsize::new(0),
            }
        }

        fn contend(&self, path: DocPath, rivals: usize) {
            *self.target.lock().unwrap() = Some(path);
            self.rivals_left.store(rivals, Ordering::SeqCst);
            self.commits.store(0, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DocumentStore for ContendedStore {
        async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
            self.inner.get(path).await
        }

        async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
            self.inner.list(collection).await
        }

        async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            let target = self.target.lock().unwrap().clone();
            if let Some(path) = target {
                let rival = self
                    .rivals_left
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
                if rival {
                    let patch = Patch::new()
                        .set("status", IssueStatus::InProgress.as_str())
                        .set("reporter", "rival@example.com");
                    self.inner.update(&path, patch).await?;
                }
            }
            self.inner.commit(batch).await
        }
    }

    fn setup() -> (Arc<ContendedStore>, Database, Issue) {
        let store = Arc::new(ContendedStore::new());
        let db = Database::new(store.clone());

        let project = block_on(db.create_project(CreateProjectInput {
            name: "Phoenix".to_string(),
            tech_stack: "Rust".to_string(),
            description: "Tracker".to_string(),
            team_members: vec![],
            status: ProjectStatus::Active,
        }))
        .unwrap();
        let issue = block_on(db.create_issue(
            CreateIssueInput {
                project_id: project.id.to_string(),
                title: "Race".to_string(),
                description: "Two writers".to_string(),
                steps_to_reproduce: "Submit twice".to_string(),
                severity: IssueSeverity::High,
                priority: IssuePriority::P1,
                reporter: "alice@example.com".to_string(),
                frequency: 1,
            },
            None,
        ))
        .unwrap();

        (store, db, issue)
    }

    fn resolve(issue: &Issue) -> CreateResolutionInput {
        CreateResolutionInput {
            issue_id: issue.id.clone(),
            resolver: "bob@example.com".to_string(),
            resolution_summary: "Serialized the writers".to_string(),
            root_cause: "Missing lock".to_string(),
            modules_affected: None,
            time_spent_hours: None,
            commit_id: Some("a1b2c3d4".to_string()),
        }
    }

    fn issue_path(issue: &Issue) -> DocPath {
        issues(&issue.project_id.to_string()).doc(&issue.id)
    }

    describe "resolution commit under contention" {
        before {
            let (store, db, issue) = setup();
        }

        it "retries after a conflicting write and ends consistent" {
            store.contend(issue_path(&issue), 1);

            let resolution = block_on(db.add_resolution(resolve(&issue))).unwrap();

            assert_eq!(store.commits.load(Ordering::SeqCst), 2);
            let reread = block_on(db.get_issue(&issue.id)).unwrap();
            assert_eq!(reread.status, IssueStatus::Resolved);
            assert_eq!(reread.updated_at, resolution.updated_at);
            // The rival's other field survives; only one resolution was written.
            assert_eq!(reread.reporter, "rival@example.com");
            let written = block_on(db.gateway().get_all(&issue_path(&issue).collection(RESOLUTIONS))).unwrap();
            assert_eq!(written.len(), 1);
            assert_eq!(written[0].id, resolution.id);
        }

        it "gives up after the attempt limit without writing anything" {
            store.contend(issue_path(&issue), usize::MAX);

            let err = block_on(db.add_resolution(resolve(&issue))).unwrap_err();

            assert!(matches!(err, Error::Store(StoreError::Conflict(_))));
            assert_eq!(store.commits.load(Ordering::SeqCst), MAX_TRANSACTION_ATTEMPTS as usize);
            let reread = block_on(db.get_issue(&issue.id)).unwrap();
            assert_eq!(reread.status, IssueStatus::InProgress);
            let written = block_on(db.gateway().get_all(&issue_path(&issue).collection(RESOLUTIONS))).unwrap();
            assert!(written.is_empty());
        }

        it "commits first time when nobody interferes" {
            store.contend(issue_path(&issue), 0);

            block_on(db.add_resolution(resolve(&issue))).unwrap();

            assert_eq!(store.commits.load(Ordering::SeqCst), 1);
            let reread = block_on(db.get_issue(&issue.id)).unwrap();
            assert_eq!(reread.status, IssueStatus::Resolved);
        }
    }

    describe "gateway transactions" {
        before {
            let db = Database::open_memory();
            let gateway = db.gateway().clone();
            let counter = CollectionPath::root("counters").doc("hits");
        }

        it "treats an absent document as a read that must stay absent" {
            let created: Result<bool, StoreError> = block_on(gateway.run_transaction(
                std::slice::from_ref(&counter),
                |tx| {
                    let fresh = tx.get(&counter)?.is_none();
                    tx.set(counter.clone(), serde_json::Map::new());
                    Ok(fresh)
                },
            ));
            assert!(created.unwrap());
            assert!(block_on(gateway.exists(&CollectionPath::root("counters"), "hits")).unwrap());
        }

        it "refuses reads that were not declared" {
            let other = CollectionPath::root("counters").doc("other");
            let result: Result<(), StoreError> = block_on(gateway.run_transaction(
                std::slice::from_ref(&counter),
                |tx| {
                    tx.get(&other)?;
                    Ok(())
                },
            ));
            assert!(matches!(result, Err(StoreError::UndeclaredRead(_))));
        }

        it "surfaces a failing update as not found and applies nothing" {
            let result: Result<(), StoreError> = block_on(gateway.run_transaction(
                std::slice::from_ref(&counter),
                |tx| {
                    tx.set(CollectionPath::root("counters").doc("side"), serde_json::Map::new());
                    tx.update(counter.clone(), Patch::new().set("n", 1));
                    Ok(())
                },
            ));
            assert!(matches!(result, Err(StoreError::NotFound(_))));
            assert!(!block_on(gateway.exists(&CollectionPath::root("counters"), "side")).unwrap());
        }
    }
}
