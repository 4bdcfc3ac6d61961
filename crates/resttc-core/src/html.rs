// ── HTML caching ──
//
// Exported requirement HTML arrives entity-escaped, with a header block we
// do not want and images that point at the file service or are inlined as
// `data:` URIs. Each fragment is unescaped, stripped of its header, and has
// every image saved under the image root and relinked to the local copy:
//
//   <image root>/specimages/<ID_REV>/<ID_REV>_<n>.<ext>
//
// `n` counts images in document order starting at 1.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lol_html::{RewriteStrSettings, doc_text, element, rewrite_str};
use tracing::{debug, info};

use crate::cache::HtmlTextCache;
use crate::command::{DownloadFile, GetHTML, TcCommand};
use crate::connection::Connection;
use crate::error::CoreError;
use crate::model::{ItemRevisionId, ModelObject};

const HEADER_SELECTOR: &str = "div.aw-requirement-header";
const IMAGE_SELECTOR: &str = "img";
const FMS_DOWNLOAD_PATH: &str = "fms/fmsdownload/";
const IMAGE_DIR: &str = "specimages";
const MISSING_SRC: &str = "<missing src>";
/// Used when a download link has no extension in its last path segment.
const FALLBACK_EXTENSION: &str = "png";

/// Fetch, rewrite and cache the HTML of `objects` in one export request.
///
/// Returns the rewritten fragments in input order.
pub async fn cache_html(
    connection: &mut Connection,
    cache: &mut HtmlTextCache,
    objects: &[ModelObject],
    image_root: &Path,
) -> Result<Vec<String>, CoreError> {
    let ids = objects
        .iter()
        .map(|obj| {
            obj.object_string()
                .map(ItemRevisionId::from_object_string)
                .ok_or_else(|| CoreError::InvalidIdentifier {
                    identifier: obj.uid.clone(),
                    reason: "object has no object_string".into(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let export = GetHTML::new(objects.to_vec(), connection.alias().fms_download_url());
    let fragments = export.send(connection).await?;
    info!(count = fragments.len(), "exported requirement text");

    let mut rewritten = Vec::with_capacity(fragments.len());
    for (id, escaped) in ids.iter().zip(fragments) {
        let html = localize_fragment(connection, id, &escaped, image_root).await?;
        cache.insert(id, html.clone());
        rewritten.push(html);
    }
    Ok(rewritten)
}

/// Unescape one fragment, drop its header, and relink its images to local
/// copies written under `image_root`.
pub async fn localize_fragment(
    connection: &mut Connection,
    id: &ItemRevisionId,
    escaped: &str,
    image_root: &Path,
) -> Result<String, CoreError> {
    let item = id.to_string();
    let html = html_escape::decode_html_entities(escaped);
    let html = strip_headers(&html).map_err(|e| rewrite_error(&item, &e))?;
    let sources = image_sources(&html).map_err(|e| rewrite_error(&item, &e))?;
    if sources.is_empty() {
        return Ok(html);
    }

    let folder = image_root.join(IMAGE_DIR).join(&item);
    tokio::fs::create_dir_all(&folder)
        .await
        .map_err(|source| CoreError::Io {
            path: folder.clone(),
            source,
        })?;

    let mut local = Vec::with_capacity(sources.len());
    for (n, src) in sources.iter().enumerate() {
        let unsupported = || CoreError::UnsupportedImageSource {
            item: item.clone(),
            src: src.clone().unwrap_or_else(|| MISSING_SRC.to_owned()),
        };
        let src = src.as_deref().ok_or_else(unsupported)?;
        let image = ImageSource::classify(src).ok_or_else(unsupported)?;
        let file_name = format!("{item}_{}.{}", n + 1, image.extension());
        let path = folder.join(&file_name);

        match image {
            ImageSource::Inline { payload, .. } => {
                let bytes = STANDARD.decode(payload.trim()).map_err(|e| CoreError::Html {
                    item: item.clone(),
                    message: format!("bad inline image {}: {e}", n + 1),
                })?;
                write_image(&path, bytes).await?;
            }
            ImageSource::FileService { .. } => {
                DownloadFile::new(src, path.clone())
                    .send(connection)
                    .await?;
            }
        }
        debug!(item = %item, file = %file_name, "image cached");
        local.push(format!("{IMAGE_DIR}/{item}/{file_name}"));
    }

    replace_image_sources(&html, &local).map_err(|e| rewrite_error(&item, &e))
}

/// Visible text of an HTML fragment, markup removed.
pub fn to_text(html: &str) -> String {
    let mut text = String::new();
    let result = rewrite_str(
        html,
        RewriteStrSettings {
            document_content_handlers: vec![doc_text!(|chunk| {
                text.push_str(chunk.as_str());
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    );
    match result {
        Ok(_) => html_escape::decode_html_entities(&text).into_owned(),
        Err(_) => String::new(),
    }
}

// ── Image sources ────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum ImageSource<'a> {
    /// `data:image/png;base64,<payload>`
    Inline { extension: &'a str, payload: &'a str },
    /// A file service download link.
    FileService { extension: &'a str },
}

impl<'a> ImageSource<'a> {
    fn classify(src: &'a str) -> Option<Self> {
        if let Some((info, data)) = src.split_once(';') {
            if info.starts_with("data:") {
                let extension = info.rsplit('/').next().unwrap_or_default();
                let payload = data.split_once(',').map_or(data, |(_, payload)| payload);
                return Some(Self::Inline { extension, payload });
            }
        }
        if src.contains(FMS_DOWNLOAD_PATH) {
            let path = src.split(['?', '#']).next().unwrap_or_default();
            let segment = path.rsplit('/').next().unwrap_or_default();
            let extension = segment
                .rsplit_once('.')
                .map(|(_, ext)| ext)
                .filter(|ext| !ext.is_empty())
                .unwrap_or(FALLBACK_EXTENSION);
            return Some(Self::FileService { extension });
        }
        None
    }

    fn extension(&self) -> &'a str {
        match self {
            Self::Inline { extension, .. } | Self::FileService { extension } => *extension,
        }
    }
}

async fn write_image(path: &Path, bytes: Vec<u8>) -> Result<(), CoreError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}

// ── Rewrite passes ───────────────────────────────────────────────────

fn rewrite_error(item: &str, e: &lol_html::errors::RewritingError) -> CoreError {
    CoreError::Html {
        item: item.to_owned(),
        message: e.to_string(),
    }
}

fn strip_headers(html: &str) -> Result<String, lol_html::errors::RewritingError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(HEADER_SELECTOR, |el| {
                el.remove();
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )
}

/// `src` of every image in document order; `None` where it is absent.
fn image_sources(html: &str) -> Result<Vec<Option<String>>, lol_html::errors::RewritingError> {
    let mut sources = Vec::new();
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(IMAGE_SELECTOR, |el| {
                sources.push(el.get_attribute("src"));
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )?;
    Ok(sources)
}

fn replace_image_sources(
    html: &str,
    local: &[String],
) -> Result<String, lol_html::errors::RewritingError> {
    let mut next = local.iter();
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(IMAGE_SELECTOR, |el| {
                if let Some(src) = next.next() {
                    el.set_attribute("src", src)?;
                }
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn classify_inline_image() {
        assert_eq!(
            ImageSource::classify("data:image/png;base64,iVBORw0KGgo="),
            Some(ImageSource::Inline {
                extension: "png",
                payload: "iVBORw0KGgo="
            })
        );
    }

    #[test]
    fn classify_file_service_image() {
        assert_eq!(
            ImageSource::classify("http://h:4544/fms/fmsdownload/pic.jpeg?ticket=abc.def"),
            Some(ImageSource::FileService { extension: "jpeg" })
        );
    }

    #[test]
    fn file_service_ticket_without_extension_falls_back() {
        assert_eq!(
            ImageSource::classify("http://10.1.2.3:4544/fms/fmsdownload/ticket"),
            Some(ImageSource::FileService { extension: "png" })
        );
        assert_eq!(
            ImageSource::classify("http://10.1.2.3:4544/fms/fmsdownload/ticket?name=a.b"),
            Some(ImageSource::FileService { extension: "png" })
        );
    }

    #[test]
    fn unknown_image_source_is_unsupported() {
        assert_eq!(ImageSource::classify("https://cdn.example.com/logo.png"), None);
    }

    #[test]
    fn header_block_is_removed() {
        let html = r#"<div class="aw-requirement-header"><h3>REQ-010 Intro</h3></div><p>Body</p>"#;
        assert_eq!(strip_headers(html).unwrap(), "<p>Body</p>");
    }

    #[test]
    fn images_are_relinked_in_order() {
        let html = r#"<p><img src="a"><img src="b"></p>"#;
        assert_eq!(
            image_sources(html).unwrap(),
            vec![Some("a".to_owned()), Some("b".to_owned())]
        );

        let local = vec!["specimages/R_A/R_A_1.png".to_owned(), "specimages/R_A/R_A_2.gif".to_owned()];
        let out = replace_image_sources(html, &local).unwrap();
        assert_eq!(
            out,
            r#"<p><img src="specimages/R_A/R_A_1.png"><img src="specimages/R_A/R_A_2.gif"></p>"#
        );
    }

    #[test]
    fn image_without_src_is_listed() {
        let html = r#"<p><img src="a"><img alt="x"></p>"#;
        assert_eq!(image_sources(html).unwrap(), vec![Some("a".to_owned()), None]);
    }

    #[test]
    fn text_drops_markup_and_decodes_entities() {
        assert_eq!(
            to_text("<div><p>Speed &lt; 5 km/h</p><ul><li>one</li><li>two</li></ul></div>"),
            "Speed < 5 km/honetwo"
        );
    }
}
