use crate::app::{Generated, QrShare};
use crate::export::{default_filename, ExportFormat};
use crate::qrcode::RenderedQr;
use crate::record::QrRecord;
use crate::settings::Settings;
use crate::share::{ShareAction, ShareTarget};
use serde::Serialize;
use tauri::{AppHandle, Runtime};
use tauri_plugin_clipboard_manager::ClipboardExt;
use tauri_plugin_notification::NotificationExt;
use tauri_plugin_shell::ShellExt;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub record: QrRecord,
    pub svg: String,
}

fn render(
    state: &QrShare,
    content: &str,
    fg: Option<String>,
    bg: Option<String>,
    compact: Option<bool>,
) -> Result<RenderedQr, String> {
    state
        .render(
            content,
            fg.as_deref(),
            bg.as_deref(),
            state.display_size(compact),
        )
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn render_qr_svg(
    state: tauri::State<'_, QrShare>,
    content: String,
    fg: Option<String>,
    bg: Option<String>,
    compact: Option<bool>,
) -> Result<String, String> {
    Ok(render(&state, &content, fg, bg, compact)?.to_svg())
}

#[tauri::command]
pub async fn generate_qr(
    state: tauri::State<'_, QrShare>,
    content: String,
    fg: Option<String>,
    bg: Option<String>,
    compact: Option<bool>,
) -> Result<Generated, String> {
    let rendered = render(&state, &content, fg, bg, compact)?;
    state.generate(&rendered).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_qr(
    state: tauri::State<'_, QrShare>,
    id: String,
    compact: Option<bool>,
) -> Result<Preview, String> {
    let record = state.resolve(&id).await.map_err(|e| e.to_string())?;
    let rendered = RenderedQr::from_record(&record, state.preview_size(compact))
        .map_err(|e| e.to_string())?;

    Ok(Preview {
        svg: rendered.to_svg(),
        record,
    })
}

/// Writes the file into the configured export directory and returns its path.
#[tauri::command]
pub async fn export_qr(
    state: tauri::State<'_, QrShare>,
    content: String,
    fg: Option<String>,
    bg: Option<String>,
    format: String,
    suffix: Option<String>,
) -> Result<String, String> {
    let format = match format.as_str() {
        "png" => ExportFormat::Png,
        "pdf" => ExportFormat::Pdf,
        other => return Err(format!("unsupported export format '{}'", other)),
    };
    let rendered = render(&state, &content, fg, bg, None)?;
    let suffix = suffix.unwrap_or_else(|| chrono::Utc::now().timestamp_millis().to_string());

    state
        .export(&rendered, format, None, &default_filename(suffix))
        .map(|path| path.display().to_string())
        .map_err(|e| e.to_string())
}

/// Carries out the share action on the desktop and returns it to the page.
#[tauri::command]
pub async fn share_qr<R: Runtime>(
    app: AppHandle<R>,
    state: tauri::State<'_, QrShare>,
    target: ShareTarget,
    content: String,
    hosted_url: Option<String>,
    current_url: Option<String>,
) -> Result<ShareAction, String> {
    // Desktop webviews have no share sheet
    let action = state.share(
        target,
        &content,
        hosted_url.as_deref(),
        current_url.as_deref(),
        false,
    );

    match &action {
        ShareAction::Open { url } => {
            app.shell().open(url, None).map_err(|e| e.to_string())?;
        }
        ShareAction::CopyToClipboard { text, notice } => {
            // Assumed to succeed, like the browser clipboard fallback
            let _ = app.clipboard().write_text(text.clone());
            notify(&app, "Copied to clipboard", notice);
        }
        ShareAction::Notice { message } => notify(&app, "Instagram Sharing", message),
        ShareAction::NativeSheet { .. } => {}
    }

    Ok(action)
}

fn notify<R: Runtime>(app: &AppHandle<R>, title: &str, body: &str) {
    if let Err(e) = app.notification().builder().title(title).body(body).show() {
        log::warn!("Failed to show notification: {}", e);
    }
}

#[tauri::command]
pub async fn get_settings(state: tauri::State<'_, QrShare>) -> Result<Settings, String> {
    Ok(state.settings().get())
}

#[tauri::command]
pub async fn update_settings(
    state: tauri::State<'_, QrShare>,
    settings: Settings,
) -> Result<(), String> {
    state.settings().update(settings).map_err(|e| e.to_string())
}
