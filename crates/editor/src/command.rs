//! JSON command protocol for driving a session.
//!
//! One command per JSON object, tagged by `command`. The binary reads them
//! from stdin; tests feed them through [`execute_json`].

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use shared::CellNum;

use crate::coords::voxel_center;
use crate::state::session::{EditingSession, SaveStatus, SessionEvent};
use crate::state::store::{cell_display_name, membership_label, Membership};
use crate::sync::SyncClient;
use crate::viewport::picking::Ray;
use crate::viewport::scene::Scene;

/// A command a script or operator can execute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    /// Request a mask from the service
    Load { mask_link: String, image_link: String },
    /// Pick with a ray, or aim straight at a cell
    Select {
        #[serde(default)]
        cell: Option<CellNum>,
        #[serde(default)]
        origin: Option<[f32; 3]>,
        #[serde(default)]
        direction: Option<[f32; 3]>,
    },
    MarkForRemoval {
        #[serde(default)]
        cell: Option<CellNum>,
        #[serde(default)]
        origin: Option<[f32; 3]>,
        #[serde(default)]
        direction: Option<[f32; 3]>,
    },
    /// Split seed at a world position or a voxel index
    MarkPoint {
        #[serde(default)]
        position: Option<[f32; 3]>,
        #[serde(default)]
        voxel: Option<[i32; 3]>,
        #[serde(default)]
        remove: bool,
    },
    CommitSplit,
    Accept,
    Reject,
    Merge,
    CommitRemoval,
    Cancel,
    Save { link: String },
    SetOpacity { opacity: f32 },
    ToggleMask { visible: bool },
    /// Apply every service reply received so far
    Poll,
    /// Report session state
    Inspect,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

/// Ray along +z through the middle of a cell
fn ray_to_cell<S: Scene, C: SyncClient>(
    session: &EditingSession<S, C>,
    cell: CellNum,
) -> Result<Ray, String> {
    let store = session.store();
    let annotation = store.get(cell).ok_or_else(|| format!("Unknown cell {cell}"))?;
    let target = annotation.region.world_aabb(store.voxel_size()).center();
    Ok(Ray::new(target - Vec3::Z * 1000.0, Vec3::Z))
}

fn resolve_ray<S: Scene, C: SyncClient>(
    session: &EditingSession<S, C>,
    cell: Option<CellNum>,
    origin: Option<[f32; 3]>,
    direction: Option<[f32; 3]>,
) -> Result<Ray, String> {
    match (cell, origin, direction) {
        (Some(cell), _, _) => ray_to_cell(session, cell),
        (None, Some(o), Some(d)) => Ok(Ray::new(Vec3::from(o), Vec3::from(d))),
        _ => Err("Expected `cell` or both `origin` and `direction`".to_string()),
    }
}

fn to_event<S: Scene, C: SyncClient>(
    session: &EditingSession<S, C>,
    cmd: EditorCommand,
) -> Result<Option<SessionEvent>, String> {
    let event = match cmd {
        EditorCommand::Load {
            mask_link,
            image_link,
        } => SessionEvent::Load {
            mask_link,
            image_link,
        },
        EditorCommand::Select {
            cell,
            origin,
            direction,
        } => SessionEvent::Select {
            ray: resolve_ray(session, cell, origin, direction)?,
        },
        EditorCommand::MarkForRemoval {
            cell,
            origin,
            direction,
        } => SessionEvent::MarkForRemoval {
            ray: resolve_ray(session, cell, origin, direction)?,
        },
        EditorCommand::MarkPoint {
            position,
            voxel,
            remove,
        } => {
            let position = match (position, voxel) {
                (Some(p), _) => Vec3::from(p),
                (None, Some(v)) => voxel_center(IVec3::from(v), session.store().voxel_size()),
                (None, None) => return Err("Expected `position` or `voxel`".to_string()),
            };
            SessionEvent::MarkPoint { position, remove }
        }
        EditorCommand::CommitSplit => SessionEvent::CommitSplit,
        EditorCommand::Accept => SessionEvent::Accept,
        EditorCommand::Reject => SessionEvent::Reject,
        EditorCommand::Merge => SessionEvent::Merge,
        EditorCommand::CommitRemoval => SessionEvent::CommitRemoval,
        EditorCommand::Cancel => SessionEvent::Cancel,
        EditorCommand::Save { link } => SessionEvent::Save { link },
        EditorCommand::SetOpacity { opacity } => SessionEvent::SetOpacity { opacity },
        EditorCommand::ToggleMask { visible } => SessionEvent::ToggleMask { visible },
        EditorCommand::Poll | EditorCommand::Inspect => return Ok(None),
    };
    Ok(Some(event))
}

/// Snapshot of the session for `inspect`
pub fn inspect<S: Scene, C: SyncClient>(session: &EditingSession<S, C>) -> serde_json::Value {
    let store = session.store();
    let points: Vec<serde_json::Value> = session
        .split_points()
        .iter()
        .map(|p| serde_json::json!({ "voxel": p.voxel.to_array(), "remove": p.remove }))
        .collect();
    let cells: Vec<serde_json::Value> = [
        Membership::Active,
        Membership::MarkedForRemoval,
        Membership::PendingNew,
    ]
    .into_iter()
    .flat_map(|m| store.ids(m).into_iter().map(move |cell| (cell, m)))
    .filter_map(|(cell, m)| store.get(cell).map(|a| (a, m)))
    .map(|(a, m)| {
        serde_json::json!({
            "cell": a.cell,
            "name": cell_display_name(a),
            "set": membership_label(m),
            "hidden": store.is_hidden(a.cell),
        })
    })
    .collect();
    let save_status = session.save_status().map(|s| match s {
        SaveStatus::Pending => "pending".to_string(),
        SaveStatus::Saved => "saved".to_string(),
        SaveStatus::Failed(e) => format!("failed: {e}"),
    });
    serde_json::json!({
        "mode": session.mode().as_str(),
        "current_cell": session.current_cell(),
        "active": store.ids(Membership::Active),
        "marked": store.marked_ids(),
        "pending": store.ids(Membership::PendingNew),
        "hidden": store.hidden_ids(),
        "next_id": store.next_available_id(),
        "split_points": points,
        "cells": cells,
        "pending_requests": session.pending_requests(),
        "save_status": save_status,
        "mask_link": session.mask_link(),
    })
}

/// Execute a single command on a session.
pub fn execute_command<S: Scene, C: SyncClient>(
    session: &mut EditingSession<S, C>,
    cmd: EditorCommand,
) -> CommandResponse {
    match cmd {
        EditorCommand::Poll => {
            let errors: Vec<String> = session.poll().iter().map(|e| e.to_string()).collect();
            return CommandResponse::ok_with_data(serde_json::json!({
                "mode": session.mode().as_str(),
                "errors": errors,
            }));
        }
        EditorCommand::Inspect => return CommandResponse::ok_with_data(inspect(session)),
        _ => {}
    }

    let event = match to_event(session, cmd) {
        Ok(Some(event)) => event,
        Ok(None) => return CommandResponse::err("Command has no session event"),
        Err(e) => return CommandResponse::err(e),
    };
    match session.handle(event) {
        Ok(()) => CommandResponse::ok_with_data(serde_json::json!({
            "mode": session.mode().as_str(),
        })),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json<S: Scene, C: SyncClient>(
    session: &mut EditingSession<S, C>,
    json: &str,
) -> Result<CommandResponse, String> {
    let cmd: EditorCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(session, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch<S: Scene, C: SyncClient>(
    session: &mut EditingSession<S, C>,
    json: &str,
) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<EditorCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds
        .into_iter()
        .map(|cmd| execute_command(session, cmd))
        .collect())
}
