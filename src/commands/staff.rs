use tauri::AppHandle;

use super::with_conn;
use crate::models::{CreateStaff, Staff, UpdateStaff};
use crate::store::staff;

#[tauri::command]
pub fn get_staff(app: AppHandle, include_archived: Option<bool>) -> Result<Vec<Staff>, String> {
    with_conn(&app, "get_staff", |conn| {
        staff::list_staff(conn, include_archived.unwrap_or(false))
    })
}

#[tauri::command]
pub fn create_staff(app: AppHandle, member: CreateStaff) -> Result<Staff, String> {
    with_conn(&app, "create_staff", |conn| staff::create_staff(conn, member))
}

#[tauri::command]
pub fn update_staff(app: AppHandle, member: UpdateStaff) -> Result<Staff, String> {
    with_conn(&app, "update_staff", |conn| staff::update_staff(conn, member))
}

#[tauri::command]
pub fn archive_staff(app: AppHandle, id: String) -> Result<Staff, String> {
    with_conn(&app, "archive_staff", |conn| staff::set_archived(conn, &id, true))
}

#[tauri::command]
pub fn unarchive_staff(app: AppHandle, id: String) -> Result<Staff, String> {
    with_conn(&app, "unarchive_staff", |conn| {
        staff::set_archived(conn, &id, false)
    })
}

#[tauri::command]
pub fn delete_staff(app: AppHandle, id: String) -> Result<(), String> {
    with_conn(&app, "delete_staff", |conn| staff::delete_staff(conn, &id))
}
