use std::time::Instant;

use chrono::DateTime;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::decode::{self, Entity, apply_fields, decode_into};
use crate::user::{Registry, User};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{}{message}", location(.path))]
    Structural { path: String, message: String },
}

fn location(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{path}: ")
    }
}

impl SnapshotError {
    pub fn structural(message: impl Into<String>) -> Self {
        SnapshotError::Structural {
            path: String::new(),
            message: message.into(),
        }
    }

    /// Prefixes the location of a structural error with an enclosing member or array index.
    pub fn within(self, segment: &str) -> Self {
        match self {
            SnapshotError::Structural { path, message } => {
                let path = if path.is_empty() {
                    segment.to_string()
                } else if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                SnapshotError::Structural { path, message }
            }
            other => other,
        }
    }
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses a snapshot document and loads it into `user`.
pub fn load_document(user: &mut User, json: &str) -> Result<(), SnapshotError> {
    let started = Instant::now();
    let root: Value = serde_json::from_str(json)?;
    load_value(user, &root)?;
    debug!(
        bytes = json.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "snapshot JSON parsed"
    );
    Ok(())
}

/// Walks the top-level members of an already parsed snapshot.
///
/// Stops at the first structural failure. Collections replaced before the failure stay
/// replaced and the failing collection keeps the elements parsed ahead of the bad one.
pub fn load_value(user: &mut User, root: &Value) -> Result<(), SnapshotError> {
    let Value::Object(members) = root else {
        return Err(SnapshotError::structural(format!(
            "expected snapshot object, found {}",
            json_kind(root)
        )));
    };

    for (name, value) in members {
        match name.as_str() {
            "since" => match value.as_i64() {
                Some(since) => {
                    user.since = since;
                    let as_of = DateTime::from_timestamp(since, 0)
                        .map(|moment| moment.to_rfc3339())
                        .unwrap_or_default();
                    debug!(since, as_of = %as_of, "user data as of");
                }
                None => debug!(found = json_kind(value), "skipping since with unexpected type"),
            },
            "data" => load_data(user, value).map_err(|err| err.within("data"))?,
            _ => {}
        }
    }
    Ok(())
}

fn load_data(user: &mut User, data: &Value) -> Result<(), SnapshotError> {
    let Value::Object(members) = data else {
        return Err(SnapshotError::structural(format!(
            "expected user object, found {}",
            json_kind(data)
        )));
    };

    // Scalars go first so every entity is stamped with this document's user id.
    apply_fields("user", decode::user_fields(), members, user)?;

    let uid = user.id;
    for (name, value) in members {
        let loaded = match name.as_str() {
            "projects" => load_collection(uid, &mut user.projects, value),
            "tags" => load_collection(uid, &mut user.tags, value),
            "tasks" => load_collection(uid, &mut user.tasks, value),
            "time_entries" => load_collection(uid, &mut user.time_entries, value),
            "workspaces" => load_collection(uid, &mut user.workspaces, value),
            "clients" => load_collection(uid, &mut user.clients, value),
            _ => continue,
        };
        loaded.map_err(|err| err.within(name))?;
    }
    Ok(())
}

fn load_collection<T: Entity>(
    uid: u64,
    registry: &mut Registry<T>,
    list: &Value,
) -> Result<(), SnapshotError> {
    registry.clear();

    let Value::Array(items) = list else {
        return Err(SnapshotError::structural(format!(
            "expected array of {} objects, found {}",
            T::KIND,
            json_kind(list)
        )));
    };

    for (index, item) in items.iter().enumerate() {
        let mut model = T::default();
        model.set_owner(uid);
        decode_into(item, &mut model).map_err(|err| err.within(&format!("[{index}]")))?;
        registry.push(model);
    }

    debug!(entity = T::KIND, count = registry.len(), "collection loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, Tag, Task, Workspace};
    use serde_json::json;

    fn snapshot() -> Value {
        json!({
            "since": 1378362830,
            "data": {
                "id": 10471231,
                "default_wid": 123,
                "api_token": "30eb0ae954b536d2f6628f7fec47beb6",
                "workspaces": [
                    { "id": 123, "name": "Personal" },
                    { "id": 124, "name": "Agency", "premium": true }
                ],
                "clients": [
                    { "id": 1, "name": "Acme", "guid": "c-1", "wid": 124 }
                ],
                "projects": [
                    { "id": 2567324, "name": "Website", "guid": "p-1", "wid": 124, "cid": 1 },
                    { "id": 2567325, "name": "Internal", "guid": "p-2", "wid": 123 }
                ],
                "tasks": [
                    { "id": 1894794, "name": "Design", "pid": 2567324, "wid": 124 }
                ],
                "tags": [
                    { "id": 5, "name": "billed", "guid": "t-1", "wid": 124 }
                ],
                "time_entries": [
                    {
                        "id": 89818605,
                        "description": "Homepage",
                        "wid": 124,
                        "pid": 2567324,
                        "tid": 1894794,
                        "start": "2013-09-05T06:33:50+00:00",
                        "stop": "2013-09-05T08:19:46+00:00",
                        "duration": 6356,
                        "billable": true,
                        "tags": ["billed"]
                    },
                    {
                        "id": 89818606,
                        "description": "Running",
                        "wid": 123,
                        "start": "2013-09-05T09:00:00+00:00",
                        "duration": -1378371600
                    }
                ],
                "unknown_section": [{ "id": 1 }]
            }
        })
    }

    fn entry(id: u64, tags: Value) -> Value {
        json!({ "id": id, "description": format!("entry {id}"), "tags": tags })
    }

    #[test]
    fn loads_every_collection_in_document_order() {
        let mut user = User::default();
        load_value(&mut user, &snapshot()).unwrap();

        assert_eq!(user.since, 1378362830);
        assert_eq!(user.id, 10471231);
        assert_eq!(user.default_wid, 123);
        assert_eq!(user.api_token, "30eb0ae954b536d2f6628f7fec47beb6");

        let workspace_names: Vec<&str> =
            user.workspaces.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(workspace_names, vec!["Personal", "Agency"]);
        assert_eq!(user.clients.len(), 1);
        assert_eq!(user.projects.len(), 2);
        assert_eq!(user.projects.as_slice()[0].id, 2567324);
        assert_eq!(user.projects.as_slice()[1].cid, 0);
        assert_eq!(user.tasks.len(), 1);
        assert_eq!(user.tags.len(), 1);
        assert_eq!(user.time_entries.len(), 2);
        assert_eq!(user.time_entries.as_slice()[1].duration, -1378371600);
    }

    #[test]
    fn loaded_entities_carry_every_field() {
        let mut user = User::default();
        load_value(&mut user, &snapshot()).unwrap();

        assert_eq!(
            user.client_by_id(1).unwrap(),
            &Client {
                id: 1,
                name: "Acme".to_string(),
                guid: "c-1".to_string(),
                wid: 124,
                uid: 10471231,
            }
        );
        assert_eq!(
            user.task_by_id(1894794).unwrap(),
            &Task {
                id: 1894794,
                name: "Design".to_string(),
                pid: 2567324,
                wid: 124,
                uid: 10471231,
            }
        );
        assert_eq!(
            user.tag_by_id(5).unwrap(),
            &Tag {
                id: 5,
                name: "billed".to_string(),
                guid: "t-1".to_string(),
                wid: 124,
                uid: 10471231,
            }
        );
        assert_eq!(
            user.workspace_by_id(123).unwrap(),
            &Workspace {
                id: 123,
                name: "Personal".to_string(),
                uid: 10471231,
            }
        );
    }

    #[test]
    fn entities_point_back_to_their_user() {
        let mut user = User::default();
        load_value(&mut user, &snapshot()).unwrap();

        assert!(user.projects.iter().all(|p| p.uid == 10471231));
        assert!(user.time_entries.iter().all(|t| t.uid == 10471231));
        assert!(user.workspaces.iter().all(|w| w.uid == 10471231));
    }

    #[test]
    fn lookups_find_loaded_ids_only() {
        let mut user = User::default();
        load_value(&mut user, &snapshot()).unwrap();

        assert_eq!(user.workspace_by_id(124).unwrap().name, "Agency");
        assert_eq!(user.client_by_id(1).unwrap().name, "Acme");
        assert_eq!(user.project_by_id(2567325).unwrap().name, "Internal");
        assert_eq!(user.task_by_id(1894794).unwrap().pid, 2567324);
        assert_eq!(user.tag_by_id(5).unwrap().name, "billed");
        assert_eq!(user.time_entry_by_id(89818605).unwrap().tags, vec!["billed"]);

        assert!(user.workspace_by_id(0).is_none());
        assert!(user.project_by_id(0).is_none());
        assert!(user.time_entry_by_id(1).is_none());
    }

    #[test]
    fn reload_replaces_every_collection() {
        let mut user = User::default();
        load_value(&mut user, &snapshot()).unwrap();

        let next = json!({
            "since": 1378400000,
            "data": {
                "id": 10471231,
                "workspaces": [{ "id": 900, "name": "New" }],
                "clients": [],
                "projects": [{ "id": 901, "name": "Fresh" }],
                "tasks": [],
                "tags": [],
                "time_entries": [{ "id": 902, "duration": 60 }]
            }
        });
        load_value(&mut user, &next).unwrap();

        assert_eq!(user.since, 1378400000);
        assert!(user.workspace_by_id(123).is_none());
        assert!(user.project_by_id(2567324).is_none());
        assert!(user.client_by_id(1).is_none());
        assert!(user.task_by_id(1894794).is_none());
        assert!(user.tag_by_id(5).is_none());
        assert!(user.time_entry_by_id(89818605).is_none());
        assert_eq!(user.workspace_by_id(900).unwrap().name, "New");
        assert_eq!(user.time_entries.len(), 1);
    }

    #[test]
    fn loading_twice_matches_loading_once() {
        let mut once = User::default();
        load_value(&mut once, &snapshot()).unwrap();

        let mut twice = User::default();
        load_value(&mut twice, &snapshot()).unwrap();
        load_value(&mut twice, &snapshot()).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn repeated_ids_are_kept_and_lookup_returns_first() {
        let mut user = User::default();
        let doc = json!({
            "data": {
                "tags": [
                    { "id": 7, "name": "first" },
                    { "id": 7, "name": "second" }
                ]
            }
        });
        load_value(&mut user, &doc).unwrap();

        assert_eq!(user.tags.len(), 2);
        assert_eq!(user.tag_by_id(7).unwrap().name, "first");
    }

    #[test]
    fn bad_element_keeps_parsed_prefix_and_reports_structural_error() {
        let mut user = User::default();
        let doc = json!({
            "data": {
                "workspaces": [{ "id": 1, "name": "Loaded first" }],
                "time_entries": [
                    entry(1, json!(["a"])),
                    entry(2, json!([])),
                    entry(3, json!("not-a-list")),
                    entry(4, json!(["b"])),
                    entry(5, json!(["c"]))
                ],
                "projects": [{ "id": 99, "name": "Never reached" }]
            }
        });

        let err = load_value(&mut user, &doc).unwrap_err();
        match &err {
            SnapshotError::Structural { path, .. } => {
                assert_eq!(path, "data.time_entries[2].tags");
            }
            other => panic!("unexpected error: {other}"),
        }

        let ids: Vec<u64> = user.time_entries.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(user.workspaces.len(), 1);
        assert!(user.projects.is_empty());
    }

    #[test]
    fn failure_leaves_unreached_collections_untouched() {
        let mut user = User::default();
        load_value(&mut user, &snapshot()).unwrap();

        let doc = json!({
            "data": {
                "clients": { "id": 1 },
                "projects": [{ "id": 5 }]
            }
        });
        let err = load_value(&mut user, &doc).unwrap_err();
        assert!(err.to_string().starts_with("data.clients: expected array"));

        assert!(user.clients.is_empty());
        assert_eq!(user.projects.len(), 2);
    }

    #[test]
    fn absent_sections_keep_previous_collections() {
        let mut user = User::default();
        load_value(&mut user, &snapshot()).unwrap();
        load_value(&mut user, &json!({ "since": 1, "data": { "tags": [] } })).unwrap();

        assert!(user.tags.is_empty());
        assert_eq!(user.projects.len(), 2);
    }

    #[test]
    fn user_id_is_stamped_even_when_listed_after_collections() {
        let mut user = User::default();
        let doc = json!({
            "data": {
                "projects": [{ "id": 1 }],
                "id": 55
            }
        });
        load_value(&mut user, &doc).unwrap();

        assert_eq!(user.id, 55);
        assert_eq!(user.project_by_id(1).unwrap().uid, 55);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let mut user = User::default();
        let err = load_document(&mut user, "{\"data\": [").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }

    #[test]
    fn non_object_root_is_structural() {
        let mut user = User::default();
        let err = load_document(&mut user, "[1, 2, 3]").unwrap_err();
        assert_eq!(err.to_string(), "expected snapshot object, found array");
    }

    #[test]
    fn mistyped_since_is_skipped() {
        let mut user = User {
            since: 42,
            ..User::default()
        };
        load_document(&mut user, r#"{"since": "yesterday"}"#).unwrap();
        assert_eq!(user.since, 42);
    }
}
