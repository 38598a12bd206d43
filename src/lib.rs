pub mod access;
pub mod admin;
pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod models;
pub mod receipts;
pub mod schedule;
pub mod store;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(test)]
mod tests;

pub use error::{AppError, Result};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cleandesk_lib=debug"));
    // A second call (tests, admin tool) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::{assistant, clients, consumables, finance, jobs, reports, staff};
    use config::AppConfig;
    use db::Database;
    use tauri::{
        menu::{Menu, MenuItem},
        tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
        Manager,
    };

    init_logging();

    let result = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .setup(|app| {
            let data_dir = app.path().app_data_dir()?;
            let config = AppConfig::load(&data_dir)?;
            tracing::info!(
                database = %config.database_path.display(),
                receipts = %config.receipts_dir.display(),
                "Starting CleanDesk"
            );

            let db = Database::open(&config.database_path)?;
            db.initialize()?;
            app.manage(db);
            app.manage(config);

            let quit = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;
            let menu = Menu::with_items(app, &[&quit])?;

            let mut tray = TrayIconBuilder::new()
                .menu(&menu)
                .show_menu_on_left_click(false);
            if let Some(icon) = app.default_window_icon() {
                tray = tray.icon(icon.clone());
            }
            let _tray = tray
                .on_tray_icon_event(|tray, event| {
                    if let TrayIconEvent::Click {
                        button: MouseButton::Left,
                        button_state: MouseButtonState::Up,
                        ..
                    } = event
                    {
                        let app = tray.app_handle();
                        if let Some(window) = app.get_webview_window("main") {
                            if window.is_visible().unwrap_or(false) {
                                let _ = window.hide();
                            } else {
                                let _ = window.show();
                                let _ = window.set_focus();
                            }
                        }
                    }
                })
                .on_menu_event(|app, event| {
                    if event.id == "quit" {
                        app.exit(0);
                    }
                })
                .build(app)?;

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Jobs
            jobs::get_jobs,
            jobs::get_job,
            jobs::create_job,
            jobs::update_job,
            jobs::assign_job,
            jobs::start_job,
            jobs::validate_job_completion,
            jobs::complete_job,
            jobs::delete_job,
            // Staff
            staff::get_staff,
            staff::create_staff,
            staff::update_staff,
            staff::archive_staff,
            staff::unarchive_staff,
            staff::delete_staff,
            // Schedule
            commands::schedule::get_week_schedule,
            commands::schedule::get_schedule_conflicts,
            // Clients
            clients::get_clients,
            clients::create_client,
            clients::update_client,
            clients::delete_client,
            clients::refresh_client,
            clients::get_client_history,
            // Consumables
            consumables::get_consumables,
            consumables::get_consumables_by_month,
            consumables::create_consumable,
            consumables::update_consumable,
            consumables::delete_consumable,
            consumables::get_eofy_summary,
            consumables::upload_receipt,
            consumables::get_receipt,
            // Finance
            finance::get_invoices,
            finance::create_invoice,
            finance::update_invoice,
            finance::mark_invoice_paid,
            finance::delete_invoice,
            finance::get_bills,
            finance::create_bill,
            finance::update_bill,
            finance::mark_bill_paid,
            finance::delete_bill,
            finance::get_quotes,
            finance::create_quote,
            finance::update_quote,
            finance::delete_quote,
            // Reports
            reports::get_job_register,
            reports::get_monthly_revenue,
            reports::get_settings,
            reports::set_setting,
            // Assistant
            assistant::suggest_allocation,
            assistant::chat_reply,
            assistant::resolve_user_role,
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        tracing::error!(error = %e, "Tauri application exited with an error");
        std::process::exit(1);
    }
}
