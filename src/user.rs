use std::fmt;

use crate::decode::Entity;
use crate::models::{Client, Project, Tag, Task, TimeEntry, Workspace};
use crate::storage::hash_token;

/// Sole owner of one kind of entity. Lookups scan in load order and return the first match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry<T> {
    items: Vec<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Registry<T> {
    pub fn find(&self, id: u64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }
}

impl<T> Registry<T> {
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub default_wid: u64,
    pub api_token: String,
    /// Server watermark of the last loaded snapshot, in unix seconds.
    pub since: i64,
    pub workspaces: Registry<Workspace>,
    pub clients: Registry<Client>,
    pub projects: Registry<Project>,
    pub tasks: Registry<Task>,
    pub tags: Registry<Tag>,
    pub time_entries: Registry<TimeEntry>,
}

impl User {
    pub fn with_token(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    pub fn workspace_by_id(&self, id: u64) -> Option<&Workspace> {
        self.workspaces.find(id)
    }

    pub fn client_by_id(&self, id: u64) -> Option<&Client> {
        self.clients.find(id)
    }

    pub fn project_by_id(&self, id: u64) -> Option<&Project> {
        self.projects.find(id)
    }

    pub fn task_by_id(&self, id: u64) -> Option<&Task> {
        self.tasks.find(id)
    }

    pub fn tag_by_id(&self, id: u64) -> Option<&Tag> {
        self.tags.find(id)
    }

    pub fn time_entry_by_id(&self, id: u64) -> Option<&TimeEntry> {
        self.time_entries.find(id)
    }

    pub fn clear_workspaces(&mut self) {
        self.workspaces.clear();
    }

    pub fn clear_clients(&mut self) {
        self.clients.clear();
    }

    pub fn clear_projects(&mut self) {
        self.projects.clear();
    }

    pub fn clear_tasks(&mut self) {
        self.tasks.clear();
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    pub fn clear_time_entries(&mut self) {
        self.time_entries.clear();
    }

    pub fn clear_all(&mut self) {
        self.clear_workspaces();
        self.clear_clients();
        self.clear_projects();
        self.clear_tasks();
        self.clear_tags();
        self.clear_time_entries();
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fingerprint = hash_token(&self.api_token);
        write!(
            f,
            "ID={} default_wid={} api_token={} since={}",
            self.id,
            self.default_wid,
            &fingerprint[..12],
            self.since
        )
    }
}
