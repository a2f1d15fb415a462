mod cards;
mod editor;
mod errors;
mod models;
mod session;
mod shell;
mod store;

pub use cards::{card_for, cards_for};
pub use editor::FieldEditor;
pub use errors::{AppError, AppResult};
pub use models::{
    Business, CardView, EditorMode, EditorSnapshot, Field, SavePayload, CARD_PREVIEW_PLACEHOLDER,
    DEFAULT_FIELD_LABELS,
};
pub use session::{EditTarget, EditorSession, SaveInstruction};
pub use shell::AppShell;
pub use store::{BusinessStore, MemoryStore, SqliteStore, StringStore, BUSINESSES_KEY};

use crate::models::{BooleanResponse, StorageInfo};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tauri::Manager;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

const DB_FILE: &str = "business-board.db";

pub struct AppState {
    shell: Mutex<AppShell>,
    storage_path: String,
}

fn lock_shell<'a>(state: &'a tauri::State<'_, AppState>) -> Result<MutexGuard<'a, AppShell>, String> {
    state
        .shell
        .lock()
        .map_err(|_| "application state lock poisoned".to_string())
}

#[tauri::command]
fn list_businesses(state: tauri::State<'_, AppState>) -> Result<Vec<CardView>, String> {
    Ok(lock_shell(&state)?.cards())
}

#[tauri::command]
fn get_business(state: tauri::State<'_, AppState>, business_id: String) -> Result<Option<Business>, String> {
    Ok(lock_shell(&state)?.business(&business_id).cloned())
}

#[tauri::command]
fn open_editor_for_new(state: tauri::State<'_, AppState>) -> Result<EditorSnapshot, String> {
    lock_shell(&state)?.open_new().map_err(to_client_error)
}

#[tauri::command]
fn open_editor_for_business(
    state: tauri::State<'_, AppState>,
    business_id: String,
) -> Result<EditorSnapshot, String> {
    lock_shell(&state)?
        .open_existing(&business_id)
        .map_err(to_client_error)
}

#[tauri::command]
fn editor_snapshot(state: tauri::State<'_, AppState>) -> Result<EditorSnapshot, String> {
    lock_shell(&state)?.editor_snapshot().map_err(to_client_error)
}

#[tauri::command]
fn set_editor_name(state: tauri::State<'_, AppState>, name: String) -> Result<(), String> {
    lock_shell(&state)?.set_editor_name(&name).map_err(to_client_error)
}

#[tauri::command]
fn add_editor_field(state: tauri::State<'_, AppState>) -> Result<EditorSnapshot, String> {
    lock_shell(&state)?.add_editor_field().map_err(to_client_error)
}

#[tauri::command]
fn remove_editor_field(
    state: tauri::State<'_, AppState>,
    field_id: String,
) -> Result<EditorSnapshot, String> {
    lock_shell(&state)?
        .remove_editor_field(&field_id)
        .map_err(to_client_error)
}

#[tauri::command]
fn set_editor_field_label(
    state: tauri::State<'_, AppState>,
    field_id: String,
    label: String,
) -> Result<(), String> {
    lock_shell(&state)?
        .set_editor_field_label(&field_id, &label)
        .map_err(to_client_error)
}

#[tauri::command]
fn set_editor_field_value(
    state: tauri::State<'_, AppState>,
    field_id: String,
    value: String,
) -> Result<(), String> {
    lock_shell(&state)?
        .set_editor_field_value(&field_id, &value)
        .map_err(to_client_error)
}

#[tauri::command]
fn editor_begin_drag(state: tauri::State<'_, AppState>, field_id: String) -> Result<(), String> {
    lock_shell(&state)?.begin_field_drag(&field_id).map_err(to_client_error)
}

#[tauri::command]
fn editor_drop_on(state: tauri::State<'_, AppState>, target_id: String) -> Result<EditorSnapshot, String> {
    lock_shell(&state)?.drop_field_on(&target_id).map_err(to_client_error)
}

#[tauri::command]
fn reorder_editor_fields(
    state: tauri::State<'_, AppState>,
    dragged_id: String,
    target_id: String,
) -> Result<EditorSnapshot, String> {
    lock_shell(&state)?
        .reorder_editor_fields(&dragged_id, &target_id)
        .map_err(to_client_error)
}

#[tauri::command]
fn cancel_editor(state: tauri::State<'_, AppState>) -> Result<BooleanResponse, String> {
    lock_shell(&state)?.cancel_editor();
    Ok(BooleanResponse { success: true })
}

#[tauri::command]
fn save_editor(state: tauri::State<'_, AppState>) -> Result<Business, String> {
    lock_shell(&state)?.save_editor().map_err(to_client_error)
}

#[tauri::command]
fn request_delete(state: tauri::State<'_, AppState>, business_id: String) -> Result<(), String> {
    lock_shell(&state)?.request_delete(&business_id).map_err(to_client_error)
}

#[tauri::command]
fn confirm_delete(state: tauri::State<'_, AppState>) -> Result<BooleanResponse, String> {
    let success = lock_shell(&state)?.confirm_delete();
    Ok(BooleanResponse { success })
}

#[tauri::command]
fn cancel_delete(state: tauri::State<'_, AppState>) -> Result<BooleanResponse, String> {
    lock_shell(&state)?.cancel_delete();
    Ok(BooleanResponse { success: true })
}

#[tauri::command]
fn storage_info(state: tauri::State<'_, AppState>) -> Result<StorageInfo, String> {
    Ok(StorageInfo {
        path_label: state.storage_path.clone(),
    })
}

pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir().map_err(|error| error.to_string())?;
            std::fs::create_dir_all(&app_data_dir).map_err(|error| error.to_string())?;
            init_tracing(&app_data_dir).map_err(|error| error.to_string())?;

            let db_path = app_data_dir.join(DB_FILE);
            let sqlite = SqliteStore::open(&db_path).map_err(|error| error.to_string())?;
            let storage_path = sqlite.db_path().to_string_lossy().to_string();
            let shell = AppShell::new(BusinessStore::new(Box::new(sqlite)));
            tracing::info!(businesses = shell.cards().len(), "business collection loaded");

            app.manage(AppState {
                shell: Mutex::new(shell),
                storage_path,
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            list_businesses,
            get_business,
            open_editor_for_new,
            open_editor_for_business,
            editor_snapshot,
            set_editor_name,
            add_editor_field,
            remove_editor_field,
            set_editor_field_label,
            set_editor_field_value,
            editor_begin_drag,
            editor_drop_on,
            reorder_editor_fields,
            cancel_editor,
            save_editor,
            request_delete,
            confirm_delete,
            cancel_delete,
            storage_info
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}

fn init_tracing(app_data_dir: &Path) -> Result<(), String> {
    let log_dir = app_data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "business-board.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}

fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}
