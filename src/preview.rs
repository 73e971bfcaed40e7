use crate::database::MetadataStore;
use crate::error::{Error, Result};
use crate::record::{QrRecord, RecordId};

/// The two addressable views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Generator,
    /// `/qr/{id}`
    Preview(String),
    Unknown(String),
}

impl Route {
    /// Match a location path, ignoring any query string or fragment.
    pub fn parse(path: &str) -> Self {
        let path = path
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default();

        if path.is_empty() || path == "/" {
            return Route::Generator;
        }

        match path.strip_prefix("/qr/") {
            Some(id) if !id.contains('/') => Route::Preview(id.to_string()),
            _ => Route::Unknown(path.to_string()),
        }
    }

    /// Extract a share identifier from a bare id, a `/qr/{id}` path or a
    /// full share URL.
    pub fn id_from_input(input: &str) -> String {
        let input = input.trim();
        let path = match input.find("://") {
            Some(scheme_end) => {
                let rest = &input[scheme_end + 3..];
                rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
            }
            None => input,
        };

        match Route::parse(path) {
            Route::Preview(id) => id,
            _ if input.contains('/') => String::new(),
            _ => input.to_string(),
        }
    }
}

/// Fetch a stored record for the read-only preview.
///
/// Nothing is written back; in particular `views` stays as stored.
pub async fn resolve(store: &dyn MetadataStore, id: &str) -> Result<QrRecord> {
    if id.trim().is_empty() {
        return Err(Error::InvalidId);
    }

    let id = RecordId::new(id);
    match store.read(&id).await {
        Ok(Some(record)) => Ok(record),
        Ok(None) => {
            log::info!("QR code {} not found", id);
            Err(Error::NotFound(id.to_string()))
        }
        Err(e) => {
            log::error!("Error fetching QR data: {}", e);
            Err(match e {
                Error::Upstream(_) => e,
                other => Error::Upstream(other.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_two_views() {
        assert_eq!(Route::parse("/"), Route::Generator);
        assert_eq!(Route::parse(""), Route::Generator);
        assert_eq!(Route::parse("/qr/AbC123"), Route::Preview("AbC123".to_string()));
        assert_eq!(Route::parse("/qr/AbC123?ref=x"), Route::Preview("AbC123".to_string()));
        assert_eq!(Route::parse("/qr/"), Route::Preview(String::new()));
        assert_eq!(Route::parse("/about"), Route::Unknown("/about".to_string()));
        assert_eq!(Route::parse("/qr/a/b"), Route::Unknown("/qr/a/b".to_string()));
    }

    #[test]
    fn ids_come_out_of_urls_and_paths() {
        assert_eq!(Route::id_from_input("AbC123"), "AbC123");
        assert_eq!(Route::id_from_input("/qr/AbC123"), "AbC123");
        assert_eq!(Route::id_from_input("https://qr.example/qr/AbC123"), "AbC123");
        assert_eq!(Route::id_from_input("https://qr.example/"), "");
        assert_eq!(Route::id_from_input("  "), "");
    }
}
