//! Folder-structure synchronization
//!
//! Mirrors a local directory tree onto the remote container tree before
//! uploading it, so that `shoot/day1/A001.mov` lands in a `day1` container
//! under a `shoot` container instead of flat in the target.
//!
//! ## Algorithm
//!
//! ```text
//! root ──→ rootContainer
//!  ├─ a.txt              plan (a.txt, rootContainer)
//!  └─ sub/               children(rootContainer) → match "sub" case-insensitively
//!      │                   found: reuse id, missing: create_container("sub")
//!      └─ b.txt          plan (sub/b.txt, subContainer)
//! ```
//!
//! Directories are visited depth-first in name order. Remote children are
//! listed fresh for every directory that has subdirectories, so a second run
//! over an unchanged tree resolves everything by name and creates nothing.
//! A failed listing or creation skips only the affected subtree.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use hotdrop_core::domain::ContainerId;
use hotdrop_core::ports::{AccessToken, IAssetService, RemoteEntry, RemoteError};
use tracing::{debug, info, warn};

use crate::ignore::should_ignore;
use crate::PipelineError;

// ============================================================================
// RemoteTree
// ============================================================================

/// The two container operations the planner needs
#[async_trait]
pub trait RemoteTree: Send + Sync {
    async fn children(&self, container: &ContainerId) -> Result<Vec<RemoteEntry>, RemoteError>;

    async fn create_container(
        &self,
        name: &str,
        parent: &ContainerId,
    ) -> Result<ContainerId, RemoteError>;
}

/// [`RemoteTree`] over an [`IAssetService`]
///
/// Holds one access token for the whole plan. A call rejected as an
/// authentication failure re-authenticates once and is retried with the
/// fresh token.
pub struct ServiceTree {
    service: Arc<dyn IAssetService>,
    token: Mutex<AccessToken>,
}

impl ServiceTree {
    pub fn new(service: Arc<dyn IAssetService>, token: AccessToken) -> Self {
        Self {
            service,
            token: Mutex::new(token),
        }
    }

    /// Authenticates and binds the resulting token
    pub async fn connect(service: Arc<dyn IAssetService>) -> Result<Self, RemoteError> {
        let token = service.authenticate().await?;
        Ok(Self::new(service, token))
    }

    fn token(&self) -> AccessToken {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn refresh(&self) -> Result<AccessToken, RemoteError> {
        debug!("Access token rejected, re-authenticating");
        let token = self.service.authenticate().await?;
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        Ok(token)
    }
}

#[async_trait]
impl RemoteTree for ServiceTree {
    async fn children(&self, container: &ContainerId) -> Result<Vec<RemoteEntry>, RemoteError> {
        let token = self.token();
        match self.service.list_container_children(container, &token).await {
            Err(err) if err.is_auth() => {
                let token = self.refresh().await?;
                self.service.list_container_children(container, &token).await
            }
            result => result,
        }
    }

    async fn create_container(
        &self,
        name: &str,
        parent: &ContainerId,
    ) -> Result<ContainerId, RemoteError> {
        let token = self.token();
        match self.service.create_container(name, parent, &token).await {
            Err(err) if err.is_auth() => {
                let token = self.refresh().await?;
                self.service.create_container(name, parent, &token).await
            }
            result => result,
        }
    }
}

// ============================================================================
// FolderSyncPlan
// ============================================================================

/// A file to upload and the container it belongs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub path: PathBuf,
    pub container: ContainerId,
}

/// A local subtree left out of the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSubtree {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of reconciling a local tree with the remote container tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSyncPlan {
    /// Every resolved local directory and its container
    pub containers: BTreeMap<PathBuf, ContainerId>,
    /// Files in depth-first order, each tagged with its directory's container
    pub files: Vec<PlannedUpload>,
    /// Subtrees that could not be resolved
    pub skipped: Vec<SkippedSubtree>,
    /// Number of containers created during planning
    pub created: usize,
}

impl FolderSyncPlan {
    /// True when no subtree was skipped
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn container_for(&self, dir: &Path) -> Option<&ContainerId> {
        self.containers.get(dir)
    }
}

// ============================================================================
// FolderSyncPlanner
// ============================================================================

/// Local directory listing split into sorted plain files and subdirectories
struct DirListing {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

async fn list_local(dir: &Path) -> std::io::Result<DirListing> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if should_ignore(&path) {
            debug!(path = %path.display(), "Ignoring system/temp entry");
            continue;
        }
        // Follow symlinks; dangling ones are skipped.
        let Ok(metadata) = tokio::fs::metadata(&path).await else {
            continue;
        };
        if metadata.is_dir() {
            dirs.push(path);
        } else if metadata.is_file() {
            files.push(path);
        }
    }

    files.sort();
    dirs.sort();
    Ok(DirListing { files, dirs })
}

/// Resolves `path` against the current working directory
///
/// Unlike `canonicalize` this leaves symlinks and `..` components alone.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Builds [`FolderSyncPlan`]s against a [`RemoteTree`]
pub struct FolderSyncPlanner<T> {
    tree: T,
}

impl<T: RemoteTree> FolderSyncPlanner<T> {
    pub fn new(tree: T) -> Self {
        Self { tree }
    }

    /// Reconciles `local_root` with `root_container`
    ///
    /// A relative `local_root` is resolved against the working directory, so
    /// every planned path is absolute. Missing containers are created as a side effect. Failures below the
    /// root are recorded in [`FolderSyncPlan::skipped`].
    ///
    /// # Errors
    /// Returns [`PipelineError::PathNotFound`] if `local_root` is not a
    /// directory and [`PipelineError::IoError`] if it cannot be read.
    pub async fn plan(
        &self,
        local_root: &Path,
        root_container: &ContainerId,
    ) -> Result<FolderSyncPlan, PipelineError> {
        let local_root = absolute_path(local_root)?;
        match tokio::fs::metadata(&local_root).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(PipelineError::PathNotFound(local_root)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::PathNotFound(local_root))
            }
            Err(err) => return Err(err.into()),
        }
        let local_root = local_root.as_path();

        info!(
            root = %local_root.display(),
            container = %root_container,
            "Planning folder sync"
        );

        let mut plan = FolderSyncPlan::default();
        plan.containers
            .insert(local_root.to_path_buf(), root_container.clone());

        let root_listing = list_local(local_root).await?;
        let mut stack = Vec::new();
        self.visit(local_root, root_container, root_listing, &mut plan, &mut stack)
            .await;

        while let Some((dir, container)) = stack.pop() {
            let listing = match list_local(&dir).await {
                Ok(listing) => listing,
                Err(err) => {
                    warn!(path = %dir.display(), error = %err, "Cannot read directory, skipping");
                    plan.skipped.push(SkippedSubtree {
                        path: dir,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            self.visit(&dir, &container, listing, &mut plan, &mut stack)
                .await;
        }

        info!(
            files = plan.files.len(),
            containers = plan.containers.len(),
            created = plan.created,
            skipped = plan.skipped.len(),
            "Folder sync plan ready"
        );
        Ok(plan)
    }

    /// Adds one directory's files and resolves its subdirectories
    ///
    /// Resolved subdirectories are pushed onto `stack` in reverse name order
    /// so that popping yields a depth-first, name-ordered walk.
    async fn visit(
        &self,
        dir: &Path,
        container: &ContainerId,
        listing: DirListing,
        plan: &mut FolderSyncPlan,
        stack: &mut Vec<(PathBuf, ContainerId)>,
    ) {
        plan.files
            .extend(listing.files.into_iter().map(|path| PlannedUpload {
                path,
                container: container.clone(),
            }));

        if listing.dirs.is_empty() {
            return;
        }

        let children = match self.tree.children(container).await {
            Ok(children) => children,
            Err(err) => {
                warn!(
                    path = %dir.display(),
                    container = %container,
                    error = %err,
                    "Cannot list remote children, skipping subdirectories"
                );
                for sub in listing.dirs {
                    plan.skipped.push(SkippedSubtree {
                        path: sub,
                        reason: err.to_string(),
                    });
                }
                return;
            }
        };

        // Lowercased name → container, first listed entry wins
        let mut by_name: HashMap<String, ContainerId> = HashMap::new();
        for entry in children.into_iter().filter(|e| e.is_container) {
            match ContainerId::new(entry.id.clone()) {
                Ok(id) => {
                    by_name.entry(entry.name.to_lowercase()).or_insert(id);
                }
                Err(err) => {
                    warn!(name = %entry.name, id = %entry.id, error = %err, "Ignoring remote entry with invalid id");
                }
            }
        }

        let mut resolved = Vec::with_capacity(listing.dirs.len());
        for sub in listing.dirs {
            let name = dir_name(&sub);
            let key = name.to_lowercase();

            let id = match by_name.get(&key) {
                Some(id) => {
                    debug!(path = %sub.display(), container = %id, "Matched existing container");
                    id.clone()
                }
                None => match self.tree.create_container(&name, container).await {
                    Ok(id) => {
                        info!(path = %sub.display(), container = %id, parent = %container, "Created container");
                        plan.created += 1;
                        by_name.insert(key, id.clone());
                        id
                    }
                    Err(err) => {
                        warn!(path = %sub.display(), error = %err, "Cannot create container, skipping subtree");
                        plan.skipped.push(SkippedSubtree {
                            path: sub,
                            reason: err.to_string(),
                        });
                        continue;
                    }
                },
            };

            plan.containers.insert(sub.clone(), id.clone());
            resolved.push((sub, id));
        }

        stack.extend(resolved.into_iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory container tree
    #[derive(Default)]
    struct MemoryTree {
        children: Mutex<HashMap<String, Vec<RemoteEntry>>>,
        next_id: Mutex<u32>,
        creations: Mutex<Vec<(String, String)>>,
        fail_create: HashSet<String>,
        fail_list: HashSet<String>,
    }

    impl MemoryTree {
        fn with_child(self, parent: &str, name: &str, id: &str) -> Self {
            self.children
                .lock()
                .unwrap()
                .entry(parent.to_string())
                .or_default()
                .push(RemoteEntry {
                    name: name.to_string(),
                    id: id.to_string(),
                    is_container: true,
                });
            self
        }

        fn creations(&self) -> Vec<(String, String)> {
            self.creations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteTree for Arc<MemoryTree> {
        async fn children(
            &self,
            container: &ContainerId,
        ) -> Result<Vec<RemoteEntry>, RemoteError> {
            if self.fail_list.contains(container.as_str()) {
                return Err(RemoteError::network("listing timed out"));
            }
            Ok(self
                .children
                .lock()
                .unwrap()
                .get(container.as_str())
                .cloned()
                .unwrap_or_default())
        }

        async fn create_container(
            &self,
            name: &str,
            parent: &ContainerId,
        ) -> Result<ContainerId, RemoteError> {
            if self.fail_create.contains(name) {
                return Err(RemoteError::from_message("403 forbidden"));
            }
            let id = {
                let mut next = self.next_id.lock().unwrap();
                *next += 1;
                format!("c{next}")
            };
            self.creations
                .lock()
                .unwrap()
                .push((name.to_string(), parent.as_str().to_string()));
            self.children
                .lock()
                .unwrap()
                .entry(parent.as_str().to_string())
                .or_default()
                .push(RemoteEntry {
                    name: name.to_string(),
                    id: id.clone(),
                    is_container: true,
                });
            Ok(ContainerId::new(id).unwrap())
        }
    }

    fn root() -> ContainerId {
        ContainerId::new("root").unwrap()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[tokio::test]
    async fn test_root_file_and_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path();
        touch(&local.join("a.txt"));
        touch(&local.join("sub/b.txt"));

        let tree = Arc::new(MemoryTree::default());
        let planner = FolderSyncPlanner::new(tree.clone());
        let plan = planner.plan(local, &root()).await.unwrap();

        assert_eq!(tree.creations(), vec![("sub".to_string(), "root".to_string())]);
        let sub_id = plan.container_for(&local.join("sub")).unwrap().clone();
        assert_eq!(sub_id.as_str(), "c1");
        assert_eq!(
            plan.files,
            vec![
                PlannedUpload {
                    path: local.join("a.txt"),
                    container: root()
                },
                PlannedUpload {
                    path: local.join("sub/b.txt"),
                    container: sub_id
                },
            ]
        );
        assert!(plan.is_complete());
        assert_eq!(plan.created, 1);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path();
        touch(&local.join("a.txt"));
        touch(&local.join("sub/b.txt"));
        touch(&local.join("sub/deeper/c.txt"));

        let tree = Arc::new(MemoryTree::default());
        let planner = FolderSyncPlanner::new(tree.clone());
        let first = planner.plan(local, &root()).await.unwrap();
        let second = planner.plan(local, &root()).await.unwrap();

        assert_eq!(first.created, 2);
        assert_eq!(second.created, 0);
        assert_eq!(tree.creations().len(), 2);
        assert_eq!(first.containers, second.containers);
        assert_eq!(first.files, second.files);
    }

    #[tokio::test]
    async fn test_existing_container_matched_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path();
        touch(&local.join("Day1/clip.mov"));

        let tree = Arc::new(MemoryTree::default().with_child("root", "DAY1", "existing"));
        let planner = FolderSyncPlanner::new(tree.clone());
        let plan = planner.plan(local, &root()).await.unwrap();

        assert!(tree.creations().is_empty());
        assert_eq!(
            plan.container_for(&local.join("Day1")).unwrap().as_str(),
            "existing"
        );
    }

    #[tokio::test]
    async fn test_case_variants_resolve_to_one_container() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path();
        touch(&local.join("Foo/a.txt"));
        touch(&local.join("foo/b.txt"));

        let tree = Arc::new(MemoryTree::default());
        let planner = FolderSyncPlanner::new(tree.clone());
        let plan = planner.plan(local, &root()).await.unwrap();

        // Case-insensitive filesystems hold a single directory here.
        let created = tree.creations().len();
        assert_eq!(created, 1);
        let ids: HashSet<_> = plan
            .files
            .iter()
            .map(|f| f.container.as_str().to_string())
            .collect();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_depth_first_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path();
        touch(&local.join("z.txt"));
        touch(&local.join("b/2.txt"));
        touch(&local.join("a/x/1.txt"));
        touch(&local.join("a/0.txt"));

        let tree = Arc::new(MemoryTree::default());
        let plan = FolderSyncPlanner::new(tree)
            .plan(local, &root())
            .await
            .unwrap();

        let order: Vec<_> = plan
            .files
            .iter()
            .map(|f| f.path.strip_prefix(local).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            order,
            vec![
                PathBuf::from("z.txt"),
                PathBuf::from("a/0.txt"),
                PathBuf::from("a/x/1.txt"),
                PathBuf::from("b/2.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_creation_skips_only_that_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path();
        touch(&local.join("bad/inner/x.txt"));
        touch(&local.join("good/y.txt"));

        let tree = Arc::new(MemoryTree {
            fail_create: HashSet::from(["bad".to_string()]),
            ..MemoryTree::default()
        });
        let plan = FolderSyncPlanner::new(tree.clone())
            .plan(local, &root())
            .await
            .unwrap();

        assert!(!plan.is_complete());
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].path, local.join("bad"));
        assert_eq!(plan.files.len(), 1);
        assert_eq!(plan.files[0].path, local.join("good/y.txt"));
        assert!(plan.container_for(&local.join("bad")).is_none());
    }

    #[tokio::test]
    async fn test_failed_listing_skips_subdirectories_but_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path();
        touch(&local.join("a.txt"));
        touch(&local.join("sub/b.txt"));

        let tree = Arc::new(MemoryTree {
            fail_list: HashSet::from(["root".to_string()]),
            ..MemoryTree::default()
        });
        let plan = FolderSyncPlanner::new(tree.clone())
            .plan(local, &root())
            .await
            .unwrap();

        assert_eq!(plan.files.len(), 1);
        assert_eq!(plan.skipped[0].path, local.join("sub"));
        assert!(tree.creations().is_empty());
    }

    #[tokio::test]
    async fn test_system_files_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path();
        touch(&local.join(".DS_Store"));
        touch(&local.join("clip.mov.part"));
        touch(&local.join("clip.mov"));

        let plan = FolderSyncPlanner::new(Arc::new(MemoryTree::default()))
            .plan(local, &root())
            .await
            .unwrap();

        assert_eq!(plan.files.len(), 1);
        assert_eq!(plan.files[0].path, local.join("clip.mov"));
    }

    #[tokio::test]
    async fn test_relative_root_plans_absolute_paths() {
        let dir = tempfile::Builder::new()
            .prefix("relative-root")
            .tempdir_in(".")
            .unwrap();
        let cwd = std::env::current_dir().unwrap();
        let relative = dir.path().strip_prefix(&cwd).unwrap().to_path_buf();
        assert!(relative.is_relative());
        touch(&dir.path().join("a.txt"));
        touch(&dir.path().join("sub/b.txt"));

        let plan = FolderSyncPlanner::new(Arc::new(MemoryTree::default()))
            .plan(&relative, &root())
            .await
            .unwrap();

        assert_eq!(plan.files.len(), 2);
        assert!(plan.files.iter().all(|f| f.path.is_absolute()));
        assert_eq!(plan.files[0].path, cwd.join(&relative).join("a.txt"));
        assert!(plan.container_for(&cwd.join(&relative).join("sub")).is_some());
    }

    #[test]
    fn test_absolute_path_keeps_absolute_input() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(absolute_path(dir.path()).unwrap(), dir.path());
        assert_eq!(
            absolute_path(Path::new("x/y")).unwrap(),
            std::env::current_dir().unwrap().join("x/y")
        );
    }

    #[tokio::test]
    async fn test_root_that_is_a_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        touch(&file);
        let result = FolderSyncPlanner::new(Arc::new(MemoryTree::default()))
            .plan(&file, &root())
            .await;
        assert!(matches!(result, Err(PipelineError::PathNotFound(_))));
    }

    /// Service whose first token expires as soon as it is used
    #[derive(Default)]
    struct ExpiringTokenService {
        issued: AtomicUsize,
        creations: AtomicUsize,
    }

    impl ExpiringTokenService {
        fn check(&self, token: &AccessToken) -> Result<(), RemoteError> {
            if token.as_str() == "token-1" {
                return Err(RemoteError::auth("token expired"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl IAssetService for ExpiringTokenService {
        async fn authenticate(&self) -> Result<AccessToken, RemoteError> {
            let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(AccessToken::new(format!("token-{n}")))
        }

        async fn upload_asset(
            &self,
            _local_path: &Path,
            _target: &ContainerId,
            _token: &AccessToken,
        ) -> Result<hotdrop_core::domain::AssetId, RemoteError> {
            Err(RemoteError::from_message("uploads are not used here"))
        }

        async fn list_container_children(
            &self,
            _container: &ContainerId,
            token: &AccessToken,
        ) -> Result<Vec<RemoteEntry>, RemoteError> {
            self.check(token)?;
            Ok(Vec::new())
        }

        async fn create_container(
            &self,
            name: &str,
            _parent: &ContainerId,
            token: &AccessToken,
        ) -> Result<ContainerId, RemoteError> {
            self.check(token)?;
            self.creations.fetch_add(1, Ordering::SeqCst);
            ContainerId::new(format!("id-{name}"))
                .map_err(|e| RemoteError::from_message(e.to_string()))
        }
    }

    #[tokio::test]
    async fn test_service_tree_reauthenticates_after_expired_token() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path();
        touch(&local.join("sub/deeper/a.txt"));

        let service = Arc::new(ExpiringTokenService::default());
        let tree = ServiceTree::connect(service.clone()).await.unwrap();
        let plan = FolderSyncPlanner::new(tree)
            .plan(local, &root())
            .await
            .unwrap();

        assert!(plan.is_complete());
        assert_eq!(plan.files.len(), 1);
        assert_eq!(service.creations.load(Ordering::SeqCst), 2);
        // One initial token plus a single refresh
        assert_eq!(service.issued.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_service_tree_gives_up_after_one_refresh() {
        struct AlwaysRejected;

        #[async_trait]
        impl IAssetService for AlwaysRejected {
            async fn authenticate(&self) -> Result<AccessToken, RemoteError> {
                Ok(AccessToken::new("stale"))
            }

            async fn upload_asset(
                &self,
                _local_path: &Path,
                _target: &ContainerId,
                _token: &AccessToken,
            ) -> Result<hotdrop_core::domain::AssetId, RemoteError> {
                Err(RemoteError::auth("rejected"))
            }

            async fn list_container_children(
                &self,
                _container: &ContainerId,
                _token: &AccessToken,
            ) -> Result<Vec<RemoteEntry>, RemoteError> {
                Err(RemoteError::auth("rejected"))
            }

            async fn create_container(
                &self,
                _name: &str,
                _parent: &ContainerId,
                _token: &AccessToken,
            ) -> Result<ContainerId, RemoteError> {
                Err(RemoteError::auth("rejected"))
            }
        }

        let tree = ServiceTree::new(Arc::new(AlwaysRejected), AccessToken::new("stale"));
        let err = tree.children(&root()).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FolderSyncPlanner::new(Arc::new(MemoryTree::default()))
            .plan(&dir.path().join("missing"), &root())
            .await;
        assert!(matches!(result, Err(PipelineError::PathNotFound(_))));
    }
}
