pub mod app;
pub mod color;
#[cfg(feature = "desktop")]
mod commands;
pub mod database;
pub mod error;
pub mod export;
pub mod host;
pub mod pdf;
pub mod preview;
pub mod qrcode;
pub mod raster;
pub mod record;
pub mod settings;
pub mod share;
pub mod workflow;

pub use app::{Generated, QrShare};
pub use error::{Error, Result};
pub use record::{NewRecord, QrRecord, RecordId};

#[cfg(feature = "desktop")]
pub fn run() {
    use tauri::Manager;

    tauri::Builder::default()
        .plugin(tauri_plugin_clipboard_manager::init())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_shell::init())
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir()?;
            let qrshare = QrShare::open(&app_data_dir)?;
            app.manage(qrshare);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::render_qr_svg,
            commands::generate_qr,
            commands::get_qr,
            commands::export_qr,
            commands::share_qr,
            commands::get_settings,
            commands::update_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
