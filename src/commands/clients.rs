use tauri::AppHandle;

use super::with_conn;
use crate::models::{Client, CreateClient, JobRecord, UpdateClient};
use crate::store::{clients, job_records};

#[tauri::command]
pub fn get_clients(app: AppHandle) -> Result<Vec<Client>, String> {
    with_conn(&app, "get_clients", clients::list_clients)
}

#[tauri::command]
pub fn create_client(app: AppHandle, client: CreateClient) -> Result<Client, String> {
    with_conn(&app, "create_client", |conn| clients::create_client(conn, client))
}

#[tauri::command]
pub fn update_client(app: AppHandle, client: UpdateClient) -> Result<Client, String> {
    with_conn(&app, "update_client", |conn| clients::update_client(conn, client))
}

#[tauri::command]
pub fn delete_client(app: AppHandle, id: String) -> Result<(), String> {
    with_conn(&app, "delete_client", |conn| clients::delete_client(conn, &id))
}

/// Recompute the cached counters shown on the client card.
#[tauri::command]
pub fn refresh_client(app: AppHandle, id: String) -> Result<Client, String> {
    with_conn(&app, "refresh_client", |conn| {
        let client = clients::get_client(conn, &id)?;
        clients::refresh_client_stats(conn, &client.name)?;
        clients::get_client(conn, &id)
    })
}

#[tauri::command]
pub fn get_client_history(app: AppHandle, client_name: String) -> Result<Vec<JobRecord>, String> {
    with_conn(&app, "get_client_history", |conn| {
        job_records::records_for_client(conn, &client_name)
    })
}
