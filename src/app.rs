use crate::color::Color;
use crate::database::{Database, MetadataStore};
use crate::error::Result;
use crate::export::{self, ExportFormat};
use crate::host::CloudinaryHost;
use crate::preview;
use crate::qrcode::{DisplaySize, RenderedQr};
use crate::raster::{CardRasterizer, Rasterizer};
use crate::record::{QrRecord, RecordId};
use crate::settings::SettingsManager;
use crate::share::{self, ShareAction, ShareRequest, ShareTarget};
use crate::workflow::{self, Generator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a successful generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generated {
    pub id: RecordId,
    pub share_url: String,
}

/// Everything a shell needs, wired from the settings file.
///
/// Upload and database settings are read once here; changing them takes
/// effect on the next start.
pub struct QrShare {
    settings: SettingsManager,
    store: Arc<Database>,
    rasterizer: Arc<CardRasterizer>,
    generator: Generator,
}

impl QrShare {
    pub fn open(app_data_dir: &Path) -> Result<Self> {
        Self::with_settings(SettingsManager::new(app_data_dir), app_data_dir)
    }

    pub fn with_settings(settings: SettingsManager, app_data_dir: &Path) -> Result<Self> {
        let current = settings.get();
        current.validate()?;

        let store = Arc::new(Database::new(&app_data_dir.join(&current.database_file))?);
        let rasterizer = Arc::new(CardRasterizer::default());
        let host = Arc::new(CloudinaryHost::with_endpoint(
            current.upload_endpoint(),
            current.cloud_name.clone(),
            current.upload_preset.clone(),
        ));
        let generator = Generator::new(rasterizer.clone(), host, store.clone());

        log::info!(
            "Using database {} and image host {}",
            app_data_dir.join(&current.database_file).display(),
            current.upload_endpoint()
        );

        Ok(Self {
            settings,
            store,
            rasterizer,
            generator,
        })
    }

    pub fn settings(&self) -> &SettingsManager {
        &self.settings
    }

    pub fn display_size(&self, compact: Option<bool>) -> DisplaySize {
        match compact {
            Some(true) => DisplaySize::Compact,
            Some(false) => DisplaySize::Regular,
            None => self.settings.get().display_size(),
        }
    }

    /// Size for the shared-link preview page.
    pub fn preview_size(&self, compact: Option<bool>) -> DisplaySize {
        self.display_size(compact).preview()
    }

    /// Colors fall back to the configured defaults.
    pub fn render(
        &self,
        content: &str,
        fg: Option<&str>,
        bg: Option<&str>,
        size: DisplaySize,
    ) -> Result<RenderedQr> {
        let settings = self.settings.get();
        let fg: Color = fg.unwrap_or(settings.default_fg.as_str()).parse()?;
        let bg: Color = bg.unwrap_or(settings.default_bg.as_str()).parse()?;
        RenderedQr::new(content, fg, bg, size)
    }

    pub async fn generate(&self, rendered: &RenderedQr) -> Result<Generated> {
        let id = self
            .generator
            .generate(
                rendered.content(),
                rendered.fg().as_str(),
                rendered.bg().as_str(),
                rendered,
            )
            .await?;
        let share_url = workflow::share_url(&self.settings.get().origin, &id);
        Ok(Generated { id, share_url })
    }

    pub fn is_generating(&self) -> bool {
        self.generator.is_generating()
    }

    pub async fn resolve(&self, id: &str) -> Result<QrRecord> {
        preview::resolve(self.store.as_ref() as &dyn MetadataStore, id).await
    }

    pub fn export(
        &self,
        rendered: &RenderedQr,
        format: ExportFormat,
        dir: Option<&Path>,
        filename: &str,
    ) -> Result<PathBuf> {
        let dir = dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.get().export_dir);
        export::export(
            format,
            self.rasterizer.as_ref() as &dyn Rasterizer,
            rendered,
            &dir,
            filename,
        )
    }

    /// `current_url` stands in for the page location when nothing is hosted yet.
    pub fn share(
        &self,
        target: ShareTarget,
        content: &str,
        hosted_url: Option<&str>,
        current_url: Option<&str>,
        native_available: bool,
    ) -> ShareAction {
        let origin = self.settings.get().origin;
        let req = ShareRequest::new(content, hosted_url, current_url.unwrap_or(origin.as_str()));
        share::share(target, &req, native_available)
    }
}
