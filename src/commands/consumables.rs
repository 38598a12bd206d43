use tauri::AppHandle;

use super::{to_ui, with_conn};
use crate::db::DatabaseExt;
use crate::models::{Consumable, ConsumableMonth, CreateConsumable, EofySummary};
use crate::receipts;
use crate::store::consumables;

#[tauri::command]
pub fn get_consumables(app: AppHandle) -> Result<Vec<Consumable>, String> {
    with_conn(&app, "get_consumables", consumables::list_consumables)
}

#[tauri::command]
pub fn get_consumables_by_month(app: AppHandle) -> Result<Vec<ConsumableMonth>, String> {
    with_conn(&app, "get_consumables_by_month", |conn| {
        Ok(consumables::group_by_month(consumables::list_consumables(conn)?))
    })
}

#[tauri::command]
pub fn create_consumable(app: AppHandle, purchase: CreateConsumable) -> Result<Consumable, String> {
    with_conn(&app, "create_consumable", |conn| {
        consumables::create_consumable(conn, purchase)
    })
}

#[tauri::command]
pub fn update_consumable(
    app: AppHandle,
    id: String,
    purchase: CreateConsumable,
) -> Result<Consumable, String> {
    with_conn(&app, "update_consumable", |conn| {
        consumables::update_consumable(conn, &id, purchase)
    })
}

/// Removes the record and its receipt photo, if any.
#[tauri::command]
pub fn delete_consumable(app: AppHandle, id: String) -> Result<(), String> {
    let receipt = with_conn(&app, "delete_consumable", |conn| {
        let item = consumables::get_consumable(conn, &id)?;
        consumables::delete_consumable(conn, &id)?;
        Ok(item.receipt_path)
    })?;

    if let Some(path) = receipt {
        if let Err(e) = receipts::delete_receipt(&app.app_config().receipts_dir, &path) {
            tracing::warn!(path = %path, error = %e, "Failed to remove receipt file");
        }
    }

    Ok(())
}

/// `fy_end_year` 2024 covers 1 July 2023 to 30 June 2024.
#[tauri::command]
pub fn get_eofy_summary(app: AppHandle, fy_end_year: i32) -> Result<EofySummary, String> {
    with_conn(&app, "get_eofy_summary", |conn| {
        consumables::eofy_summary(conn, fy_end_year)
    })
}

#[tauri::command]
pub fn upload_receipt(
    app: AppHandle,
    created_by: String,
    extension: String,
    bytes: Vec<u8>,
) -> Result<String, String> {
    to_ui(
        "upload_receipt",
        receipts::save_receipt(&app.app_config().receipts_dir, &created_by, &extension, &bytes),
    )
}

#[tauri::command]
pub fn get_receipt(app: AppHandle, path: String) -> Result<Vec<u8>, String> {
    to_ui(
        "get_receipt",
        receipts::load_receipt(&app.app_config().receipts_dir, &path),
    )
}
