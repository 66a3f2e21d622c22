//! Per-entity field tables that map snapshot JSON members onto model fields.
//!
//! Every entity gets one table, built on first use. Members without a handler are ignored so
//! newer server fields never break an older client. A member whose JSON type does not match the
//! model field is skipped and the field keeps its previous value.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::Value;
use tracing::debug;

use crate::models::{Client, Project, Tag, Task, TimeEntry, Workspace};
use crate::snapshot::{SnapshotError, json_kind};
use crate::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerced {
    Assigned,
    Skipped,
}

pub type Assign<T> = fn(&mut T, &Value) -> Result<Coerced, SnapshotError>;

pub struct FieldTable<T> {
    handlers: HashMap<&'static str, Assign<T>>,
}

impl<T> FieldTable<T> {
    fn new(fields: &[(&'static str, Assign<T>)]) -> Self {
        Self {
            handlers: fields.iter().copied().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Assign<T>> {
        self.handlers.get(name).copied()
    }

    #[cfg(test)]
    fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

/// A record owned by one of the user's collections.
pub trait Entity: Default + 'static {
    /// Name used in log fields and error messages.
    const KIND: &'static str;

    fn fields() -> &'static FieldTable<Self>;

    fn id(&self) -> u64;

    fn set_owner(&mut self, uid: u64);
}

/// Populates `model` from one JSON object, visiting its members in document order.
pub fn decode_into<T: Entity>(node: &Value, model: &mut T) -> Result<(), SnapshotError> {
    let Value::Object(members) = node else {
        return Err(SnapshotError::structural(format!(
            "expected {} object, found {}",
            T::KIND,
            json_kind(node)
        )));
    };
    apply_fields(T::KIND, T::fields(), members, model)
}

pub(crate) fn apply_fields<T>(
    kind: &'static str,
    table: &FieldTable<T>,
    members: &serde_json::Map<String, Value>,
    model: &mut T,
) -> Result<(), SnapshotError> {
    for (name, value) in members {
        let Some(assign) = table.get(name) else {
            continue;
        };
        let outcome = assign(model, value).map_err(|err| err.within(name))?;
        if outcome == Coerced::Skipped {
            debug!(
                entity = kind,
                field = %name,
                found = json_kind(value),
                "skipping field with unexpected type"
            );
        }
    }
    Ok(())
}

fn set_u64(target: &mut u64, value: &Value) -> Result<Coerced, SnapshotError> {
    Ok(match value.as_u64() {
        Some(number) => {
            *target = number;
            Coerced::Assigned
        }
        None => Coerced::Skipped,
    })
}

fn set_i64(target: &mut i64, value: &Value) -> Result<Coerced, SnapshotError> {
    Ok(match value.as_i64() {
        Some(number) => {
            *target = number;
            Coerced::Assigned
        }
        None => Coerced::Skipped,
    })
}

fn set_string(target: &mut String, value: &Value) -> Result<Coerced, SnapshotError> {
    Ok(match value.as_str() {
        Some(text) => {
            *target = text.to_string();
            Coerced::Assigned
        }
        None => Coerced::Skipped,
    })
}

fn set_bool(target: &mut bool, value: &Value) -> Result<Coerced, SnapshotError> {
    Ok(match value.as_bool() {
        Some(flag) => {
            *target = flag;
            Coerced::Assigned
        }
        None => Coerced::Skipped,
    })
}

/// Replaces the tag list with the non-empty strings of a JSON array, in order.
fn set_tags(target: &mut Vec<String>, value: &Value) -> Result<Coerced, SnapshotError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => {
            target.clear();
            return Ok(Coerced::Assigned);
        }
        other => {
            return Err(SnapshotError::structural(format!(
                "expected array of tag names, found {}",
                json_kind(other)
            )));
        }
    };

    target.clear();
    for (index, item) in items.iter().enumerate() {
        match item.as_str() {
            Some("") => {}
            Some(name) => target.push(name.to_string()),
            None => debug!(
                index,
                found = json_kind(item),
                "skipping tag name with unexpected type"
            ),
        }
    }
    Ok(Coerced::Assigned)
}

static WORKSPACE_FIELDS: LazyLock<FieldTable<Workspace>> = LazyLock::new(|| {
    FieldTable::<Workspace>::new(&[
        ("id", |m, v| set_u64(&mut m.id, v)),
        ("name", |m, v| set_string(&mut m.name, v)),
    ])
});

static CLIENT_FIELDS: LazyLock<FieldTable<Client>> = LazyLock::new(|| {
    FieldTable::<Client>::new(&[
        ("id", |m, v| set_u64(&mut m.id, v)),
        ("name", |m, v| set_string(&mut m.name, v)),
        ("guid", |m, v| set_string(&mut m.guid, v)),
        ("wid", |m, v| set_u64(&mut m.wid, v)),
    ])
});

static PROJECT_FIELDS: LazyLock<FieldTable<Project>> = LazyLock::new(|| {
    FieldTable::<Project>::new(&[
        ("id", |m, v| set_u64(&mut m.id, v)),
        ("name", |m, v| set_string(&mut m.name, v)),
        ("guid", |m, v| set_string(&mut m.guid, v)),
        ("wid", |m, v| set_u64(&mut m.wid, v)),
        ("cid", |m, v| set_u64(&mut m.cid, v)),
    ])
});

static TASK_FIELDS: LazyLock<FieldTable<Task>> = LazyLock::new(|| {
    FieldTable::<Task>::new(&[
        ("id", |m, v| set_u64(&mut m.id, v)),
        ("name", |m, v| set_string(&mut m.name, v)),
        ("pid", |m, v| set_u64(&mut m.pid, v)),
        ("wid", |m, v| set_u64(&mut m.wid, v)),
    ])
});

static TAG_FIELDS: LazyLock<FieldTable<Tag>> = LazyLock::new(|| {
    FieldTable::<Tag>::new(&[
        ("id", |m, v| set_u64(&mut m.id, v)),
        ("name", |m, v| set_string(&mut m.name, v)),
        ("guid", |m, v| set_string(&mut m.guid, v)),
        ("wid", |m, v| set_u64(&mut m.wid, v)),
    ])
});

static TIME_ENTRY_FIELDS: LazyLock<FieldTable<TimeEntry>> = LazyLock::new(|| {
    FieldTable::<TimeEntry>::new(&[
        ("id", |m, v| set_u64(&mut m.id, v)),
        ("description", |m, v| set_string(&mut m.description, v)),
        ("guid", |m, v| set_string(&mut m.guid, v)),
        ("wid", |m, v| set_u64(&mut m.wid, v)),
        ("pid", |m, v| set_u64(&mut m.pid, v)),
        ("tid", |m, v| set_u64(&mut m.tid, v)),
        ("start", |m, v| set_string(&mut m.start, v)),
        ("stop", |m, v| set_string(&mut m.stop, v)),
        ("duration", |m, v| set_i64(&mut m.duration, v)),
        ("ui_modified_at", |m, v| set_u64(&mut m.ui_modified_at, v)),
        ("billable", |m, v| set_bool(&mut m.billable, v)),
        ("duronly", |m, v| set_bool(&mut m.duronly, v)),
        ("tags", |m, v| set_tags(&mut m.tags, v)),
    ])
});

// Collections under `data` are walked by the snapshot loader; only the scalars live here.
static USER_FIELDS: LazyLock<FieldTable<User>> = LazyLock::new(|| {
    FieldTable::<User>::new(&[
        ("id", |m, v| set_u64(&mut m.id, v)),
        ("default_wid", |m, v| set_u64(&mut m.default_wid, v)),
        ("api_token", |m, v| set_string(&mut m.api_token, v)),
    ])
});

pub fn user_fields() -> &'static FieldTable<User> {
    &USER_FIELDS
}

impl Entity for Workspace {
    const KIND: &'static str = "workspace";

    fn fields() -> &'static FieldTable<Self> {
        &WORKSPACE_FIELDS
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn set_owner(&mut self, uid: u64) {
        self.uid = uid;
    }
}

impl Entity for Client {
    const KIND: &'static str = "client";

    fn fields() -> &'static FieldTable<Self> {
        &CLIENT_FIELDS
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn set_owner(&mut self, uid: u64) {
        self.uid = uid;
    }
}

impl Entity for Project {
    const KIND: &'static str = "project";

    fn fields() -> &'static FieldTable<Self> {
        &PROJECT_FIELDS
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn set_owner(&mut self, uid: u64) {
        self.uid = uid;
    }
}

impl Entity for Task {
    const KIND: &'static str = "task";

    fn fields() -> &'static FieldTable<Self> {
        &TASK_FIELDS
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn set_owner(&mut self, uid: u64) {
        self.uid = uid;
    }
}

impl Entity for Tag {
    const KIND: &'static str = "tag";

    fn fields() -> &'static FieldTable<Self> {
        &TAG_FIELDS
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn set_owner(&mut self, uid: u64) {
        self.uid = uid;
    }
}

impl Entity for TimeEntry {
    const KIND: &'static str = "time entry";

    fn fields() -> &'static FieldTable<Self> {
        &TIME_ENTRY_FIELDS
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn set_owner(&mut self, uid: u64) {
        self.uid = uid;
    }
}
