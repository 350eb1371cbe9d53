use crate::error::StoreError;
use crate::task::{Status, Task};
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Fields to change on an existing task. `None` leaves the field as it is.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub description: Option<String>,
    pub status: Option<Status>,
}

impl TaskUpdate {
    pub fn status(status: Status) -> Self {
        Self {
            description: None,
            status: Some(status),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.status.is_none()
    }
}

/// Smallest positive ID not used by `tasks`.
///
/// IDs freed by deletions are handed out again before the range grows.
pub fn next_id(tasks: &[Task]) -> u32 {
    let mut ids: Vec<u32> = tasks.iter().map(Task::id).filter(|id| *id > 0).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut next = 1;
    for id in ids {
        if id != next {
            break;
        }
        next += 1;
    }
    next
}

/// Handle to the JSON file holding the task collection.
///
/// `load` and `save` are the only methods touching the file. Every other
/// operation is a single load, an in-memory change and at most one save.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the collection in stored order.
    ///
    /// A missing, unreadable or unparsable file is replaced with `[]` and an
    /// empty collection is returned. Whatever the file held is discarded.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Vec<Task>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("tasks file does not exist, creating it");
                return self.reset();
            }
            Err(err) => {
                warn!(error = %err, "cannot read tasks file, starting from an empty list");
                return self.reset();
            }
        };

        if contents.trim().is_empty() {
            debug!("tasks file is empty, resetting it");
            return self.reset();
        }

        match serde_json::from_str::<Vec<Task>>(&contents) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                Ok(tasks)
            }
            Err(err) => {
                warn!(error = %err, "tasks file is not valid, starting from an empty list");
                self.reset()
            }
        }
    }

    /// Overwrites the file with `tasks`, pretty-printed.
    #[tracing::instrument(skip(self, tasks), fields(path = %self.path.display(), count = tasks.len()))]
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string_pretty(tasks)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!("saved tasks");
        Ok(())
    }

    fn reset(&self) -> Result<Vec<Task>> {
        self.save(&[])?;
        Ok(Vec::new())
    }

    /// Appends a new `todo` task. Returns `None` without touching the file
    /// when `description` is empty.
    #[tracing::instrument(skip(self))]
    pub fn add(&self, description: &str) -> Result<Option<Task>> {
        if description.is_empty() {
            debug!("refusing to add a task without a description");
            return Ok(None);
        }

        let mut tasks = self.load()?;
        let task = Task::new(next_id(&tasks), description.to_string());
        tasks.push(task.clone());
        self.save(&tasks)?;
        Ok(Some(task))
    }

    /// Applies `update` to the task with `id` and refreshes its `updated_at`.
    /// Returns `None` if no task has that ID; nothing is written then.
    #[tracing::instrument(skip(self))]
    pub fn update(&self, id: u32, update: TaskUpdate) -> Result<Option<Task>> {
        let mut tasks = self.load()?;
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            debug!("task not found");
            return Ok(None);
        };

        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        task.updated_at = Utc::now();
        let updated = task.clone();

        self.save(&tasks)?;
        Ok(Some(updated))
    }

    /// Removes the task with `id`, keeping the order of the rest.
    /// Returns `None` if no task has that ID; nothing is written then.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, id: u32) -> Result<Option<Task>> {
        let mut tasks = self.load()?;
        let Some(index) = tasks.iter().position(|task| task.id == id) else {
            debug!("task not found");
            return Ok(None);
        };

        let removed = tasks.remove(index);
        self.save(&tasks)?;
        Ok(Some(removed))
    }

    pub fn list_all(&self) -> Result<Vec<Task>> {
        self.load()
    }

    /// Tasks whose status matches `status`, ignoring case. Unknown status
    /// text matches nothing.
    #[tracing::instrument(skip(self))]
    pub fn list_by_status(&self, status: &str) -> Result<Vec<Task>> {
        let tasks = self.load()?;
        let Ok(status) = status.parse::<Status>() else {
            debug!("unknown status filter");
            return Ok(Vec::new());
        };
        Ok(tasks
            .into_iter()
            .filter(|task| task.status == status)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    fn store_in(temp: &TempDir) -> TaskStore {
        TaskStore::new(temp.child("tasks.json").path())
    }

    #[test]
    fn load_creates_missing_file() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        // Act
        let tasks = store.load().unwrap();

        // Assert
        assert!(tasks.is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[test]
    fn load_repairs_empty_file() {
        let temp = TempDir::new().unwrap();
        temp.child("tasks.json").write_str("").unwrap();
        let store = store_in(&temp);

        let tasks = store.load().unwrap();

        assert!(tasks.is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[test]
    fn load_repairs_corrupt_file() {
        let temp = TempDir::new().unwrap();
        temp.child("tasks.json").write_str("{ not json").unwrap();
        let store = store_in(&temp);

        let tasks = store.load().unwrap();

        assert!(tasks.is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[test]
    fn load_repairs_file_that_is_not_utf8() {
        let temp = TempDir::new().unwrap();
        temp.child("tasks.json").write_binary(&[0xff, 0xfe, 0x5b]).unwrap();
        let store = store_in(&temp);

        let tasks = store.load().unwrap();

        assert!(tasks.is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[test]
    fn save_then_load_returns_same_tasks() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let mut done = Task::new(2, "Second".to_string());
        done.status = Status::Done;
        let tasks = vec![Task::new(1, "First".to_string()), done];

        // Act
        store.save(&tasks).unwrap();
        let loaded = store.load().unwrap();

        // Assert
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn save_pretty_prints() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.save(&[Task::new(1, "First".to_string())]).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("\n    \"description\": \"First\""));
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let store = TaskStore::new(temp.path().join("missing").join("tasks.json"));

        let err = store.save(&[]).unwrap_err();

        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[test]
    fn next_id_of_empty_collection_is_one() {
        assert_eq!(next_id(&[]), 1);
    }

    #[test]
    fn next_id_fills_the_first_gap() {
        let tasks = vec![
            Task::new(3, "c".to_string()),
            Task::new(1, "a".to_string()),
            Task::new(4, "d".to_string()),
        ];

        assert_eq!(next_id(&tasks), 2);
    }

    #[test]
    fn next_id_ignores_zero_id() {
        let tasks = vec![Task::new(0, "zero".to_string()), Task::new(1, "one".to_string())];

        assert_eq!(next_id(&tasks), 2);
    }

    #[test]
    fn add_after_stored_zero_id_stays_unique() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store
            .save(&[Task::new(0, "zero".to_string()), Task::new(1, "one".to_string())])
            .unwrap();

        // Act
        let task = store.add("two").unwrap().unwrap();

        // Assert
        assert_eq!(task.id(), 2);
        let ids: Vec<u32> = store.list_all().unwrap().iter().map(Task::id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn next_id_after_dense_range_is_max_plus_one() {
        let tasks = vec![
            Task::new(2, "b".to_string()),
            Task::new(1, "a".to_string()),
            Task::new(3, "c".to_string()),
        ];

        assert_eq!(next_id(&tasks), 4);
    }

    #[test]
    fn added_tasks_get_sequential_ids() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let ids: Vec<u32> = ["Task 1", "Task 2", "Task 3"]
            .iter()
            .map(|d| store.add(d).unwrap().unwrap().id())
            .collect();

        assert_eq!(ids, vec![1, 2, 3]);
        let descriptions: Vec<String> = store
            .list_all()
            .unwrap()
            .iter()
            .map(|t| t.description().to_string())
            .collect();
        assert_eq!(descriptions, vec!["Task 1", "Task 2", "Task 3"]);
    }

    #[test]
    fn add_reuses_deleted_id() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.add("Task 1").unwrap();
        store.add("Task 2").unwrap();
        store.add("Task 3").unwrap();

        // Act
        store.delete(2).unwrap();
        let task = store.add("Task 4").unwrap().unwrap();

        // Assert
        assert_eq!(task.id(), 2);
        let ids: Vec<u32> = store.list_all().unwrap().iter().map(Task::id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn add_with_empty_description_does_nothing() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        assert_eq!(store.add("").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn add_keeps_whitespace_only_description() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let task = store.add("   ").unwrap().unwrap();

        assert_eq!(task.description(), "   ");
    }

    #[test]
    fn update_changes_description_and_status() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let original = store.add("Buy milk").unwrap().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        // Act
        let updated = store
            .update(
                original.id(),
                TaskUpdate {
                    description: Some("Buy oat milk".to_string()),
                    status: Some(Status::InProgress),
                },
            )
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(updated.description(), "Buy oat milk");
        assert_eq!(updated.status(), Status::InProgress);
        assert_eq!(updated.created_at(), original.created_at());
        assert!(updated.updated_at() > original.updated_at());
        assert_eq!(store.list_all().unwrap(), vec![updated]);
    }

    #[test]
    fn update_status_only_keeps_description() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.add("Buy milk").unwrap();

        let updated = store
            .update(1, TaskUpdate::status(Status::Done))
            .unwrap()
            .unwrap();

        assert_eq!(updated.description(), "Buy milk");
        assert_eq!(updated.status(), Status::Done);
    }

    #[test]
    fn update_missing_task_leaves_file_untouched() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.add("Buy milk").unwrap();
        let before = fs::read(store.path()).unwrap();

        // Act
        let result = store.update(42, TaskUpdate::status(Status::Done)).unwrap();

        // Assert
        assert_eq!(result, None);
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn delete_missing_task_reports_none() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.add("Buy milk").unwrap();
        let before = fs::read(store.path()).unwrap();

        assert_eq!(store.delete(5).unwrap(), None);
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn delete_keeps_order_of_survivors() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        for description in ["a", "b", "c", "d"] {
            store.add(description).unwrap();
        }

        let removed = store.delete(2).unwrap().unwrap();

        assert_eq!(removed.description(), "b");
        let ids: Vec<u32> = store.list_all().unwrap().iter().map(Task::id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn list_by_status_ignores_case() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.add("Buy milk").unwrap();
        store.add("Write report").unwrap();
        store.update(2, TaskUpdate::status(Status::Done)).unwrap();

        // Act
        let done = store.list_by_status("Done").unwrap();

        // Assert
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id(), 2);
    }

    #[test]
    fn list_by_unknown_status_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.add("Buy milk").unwrap();

        assert!(store.list_by_status("someday").unwrap().is_empty());
    }
}
