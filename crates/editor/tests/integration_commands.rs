//! Integration tests for the EditorCommand JSON protocol.
//!
//! Tests the full command pipeline: JSON string -> parse -> execute -> response.

use cell_editor_lib::command::{execute_json, execute_json_batch};
use cell_editor_lib::fixtures::split_response_json;
use cell_editor_lib::harness::TestHarness;

#[test]
fn test_command_load_and_poll() {
    let mut h = TestHarness::new();
    let resp = execute_json(
        &mut h.session,
        r#"{"command": "load", "mask_link": "mask.tif", "image_link": "image.tif"}"#,
    )
    .unwrap();
    assert!(resp.success);
    assert_eq!(h.sent_count("load"), 1);

    h.session
        .client_mut()
        .respond_last(cell_editor_lib::fixtures::load_response_json(&[1, 2]));
    let resp = execute_json(&mut h.session, r#"{"command": "poll"}"#).unwrap();
    assert!(resp.success);
    assert_eq!(resp.data.unwrap()["errors"], serde_json::json!([]));
    assert_eq!(h.session.store().len(), 2);
}

#[test]
fn test_command_split_workflow() {
    let mut h = TestHarness::with_cells(&[3]);
    let json = r#"[
        {"command": "select", "cell": 3},
        {"command": "mark_point", "voxel": [30, 0, 0]},
        {"command": "mark_point", "voxel": [33, 3, 3]},
        {"command": "commit_split"}
    ]"#;
    let responses = execute_json_batch(&mut h.session, json).unwrap();
    assert!(responses.iter().all(|r| r.success));

    h.session
        .client_mut()
        .respond_last(split_response_json(&[(3, false), (4, false)]));
    let resp = execute_json(&mut h.session, r#"{"command": "poll"}"#).unwrap();
    assert_eq!(resp.data.unwrap()["mode"], "verify");

    let resp = execute_json(&mut h.session, r#"{"command": "accept"}"#).unwrap();
    assert!(resp.success);

    let data = execute_json(&mut h.session, r#"{"command": "inspect"}"#)
        .unwrap()
        .data
        .unwrap();
    assert_eq!(data["mode"], "idle");
    assert_eq!(data["active"], serde_json::json!([3, 4]));
    assert_eq!(data["next_id"], 5);
}

#[test]
fn test_command_removal_batch() {
    let mut h = TestHarness::with_cells(&[1, 2, 3]);
    let json = r#"[
        {"command": "mark_for_removal", "cell": 1},
        {"command": "mark_for_removal", "cell": 3},
        {"command": "commit_removal"}
    ]"#;
    let responses = execute_json_batch(&mut h.session, json).unwrap();
    assert!(responses.iter().all(|r| r.success));
    assert_eq!(h.sent_count("remove"), 1);
    assert_eq!(h.session.store().len(), 1);
}

#[test]
fn test_command_unknown_cell() {
    let mut h = TestHarness::with_cells(&[1]);
    let resp = execute_json(&mut h.session, r#"{"command": "select", "cell": 42}"#).unwrap();
    assert!(!resp.success);
    assert!(resp.error.unwrap().contains("42"));
}

#[test]
fn test_command_save_status() {
    let mut h = TestHarness::with_cells(&[1]);
    execute_json(&mut h.session, r#"{"command": "save", "link": "out.tif"}"#).unwrap();
    let data = execute_json(&mut h.session, r#"{"command": "inspect"}"#)
        .unwrap()
        .data
        .unwrap();
    assert_eq!(data["save_status"], "pending");
}

#[test]
fn test_command_display_controls() {
    let mut h = TestHarness::with_cells(&[1, 2]);
    let resp = execute_json(&mut h.session, r#"{"command": "toggle_mask", "visible": false}"#)
        .unwrap();
    assert!(resp.success);
    assert_eq!(h.visible_count(), 0);

    let resp = execute_json(&mut h.session, r#"{"command": "set_opacity", "opacity": 0.3}"#)
        .unwrap();
    assert!(resp.success);
    assert_eq!(h.session.store().opacity(), 0.3);
}

#[test]
fn test_command_unknown_rejected() {
    let mut h = TestHarness::new();
    assert!(execute_json(&mut h.session, r#"{"command": "explode"}"#).is_err());
}
