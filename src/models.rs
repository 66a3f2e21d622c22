use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: u64,
    pub name: String,
    pub uid: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: u64,
    pub name: String,
    pub guid: String,
    pub wid: u64,
    pub uid: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub guid: String,
    pub wid: u64,
    /// Zero when the project has no client.
    pub cid: u64,
    pub uid: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub name: String,
    pub pid: u64,
    pub wid: u64,
    pub uid: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub guid: String,
    pub wid: u64,
    pub uid: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub description: String,
    pub guid: String,
    pub wid: u64,
    pub pid: u64,
    pub tid: u64,
    pub start: String,
    pub stop: String,
    /// Negative while the entry is still running; kept exactly as the server sent it.
    pub duration: i64,
    pub billable: bool,
    pub duronly: bool,
    pub ui_modified_at: u64,
    pub tags: Vec<String>,
    pub uid: u64,
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID={} name={}", self.id, self.name)
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID={} name={} wid={} guid={}",
            self.id, self.name, self.wid, self.guid
        )
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID={} name={} wid={} cid={} guid={}",
            self.id, self.name, self.wid, self.cid, self.guid
        )
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID={} name={} wid={} pid={}",
            self.id, self.name, self.wid, self.pid
        )
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID={} name={} wid={} guid={}",
            self.id, self.name, self.wid, self.guid
        )
    }
}

impl fmt::Display for TimeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID={} description={} wid={} guid={} pid={} tid={} start={} stop={} duration={} billable={} duronly={} uimodifiedat={} tags={}",
            self.id,
            self.description,
            self.wid,
            self.guid,
            self.pid,
            self.tid,
            self.start,
            self.stop,
            self.duration,
            self.billable,
            self.duronly,
            self.ui_modified_at,
            self.tags.join(",")
        )
    }
}
