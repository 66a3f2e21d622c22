//! Loads a Toggl account snapshot into an in-memory model and infers projects from desktop
//! activity.

pub mod autotracker;
pub mod decode;
pub mod models;
pub mod snapshot;
pub mod storage;
pub mod sync;
pub mod toggl;
pub mod user;
