//! Static site rendering for composed records.
//!
//! For every record that has composed copy and media, [`render_site`] writes
//! `<site_dir>/<id>.html` with its images copied into `<site_dir>/images/`,
//! then an `index.html` listing every page and a `manifest.json` with page
//! checksums. Rendering only reads records; it never changes their state.

use std::path::{Path, PathBuf};

use chrono::Utc;
use newsrelay_shared::{ItemId, NewsRelayError, Result, WorkItem};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Directory under the site root that holds copied media.
const IMAGES_DIR: &str = "images";

/// Renderer settings.
#[derive(Debug, Clone)]
pub struct SiteOptions {
    pub site_dir: PathBuf,
    /// Link target of images and the call-to-action button. Empty for none.
    pub call_to_action_url: String,
    /// Public base URL used for the links in `index.html`.
    pub base_url: Option<Url>,
}

/// Metadata for one rendered page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PageMeta {
    pub id: ItemId,
    pub file_name: String,
    pub title: String,
    pub sha256: String,
    pub size_bytes: usize,
    pub images: usize,
}

/// Outcome of one render pass.
#[derive(Debug, Clone, Default)]
pub struct RenderSummary {
    pub pages: Vec<PageMeta>,
    /// Composed records skipped because none of their media files exist.
    pub skipped: Vec<ItemId>,
}

#[derive(serde::Serialize)]
struct SiteManifest<'a> {
    generated_at: String,
    pages: &'a [PageMeta],
}

/// File name of a record's page.
pub fn page_file_name(id: &ItemId) -> String {
    format!("{id}.html")
}

/// Public URL of a record's page under `base`.
pub fn artifact_url(base: &Url, id: &ItemId) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&page_file_name(id))
        .map_err(|e| NewsRelayError::validation(format!("cannot build page URL for {id}: {e}")))
}

/// Render pages for all composed records plus the index and manifest.
#[instrument(skip_all, fields(site_dir = %opts.site_dir.display(), records = items.len()))]
pub fn render_site(items: &[WorkItem], opts: &SiteOptions) -> Result<RenderSummary> {
    let images_dir = opts.site_dir.join(IMAGES_DIR);
    std::fs::create_dir_all(&images_dir).map_err(|e| NewsRelayError::io(&images_dir, e))?;

    let mut summary = RenderSummary::default();

    for item in items {
        let Some(copy) = item.composed_copy() else {
            continue;
        };

        let images = copy_media(item.media_refs(), &images_dir)?;
        if images.is_empty() {
            warn!(item_id = %item.id, "no media files on disk, page skipped");
            summary.skipped.push(item.id);
            continue;
        }

        let title = if copy.title.trim().is_empty() {
            item.article_title.as_str()
        } else {
            copy.title.as_str()
        };
        let html = page_html(title, &images, &opts.call_to_action_url);
        let file_name = page_file_name(&item.id);
        write_atomic(&opts.site_dir, &file_name, &html)?;
        debug!(item_id = %item.id, images = images.len(), "wrote page");

        summary.pages.push(PageMeta {
            id: item.id,
            file_name,
            title: title.to_string(),
            sha256: sha256_hex(html.as_bytes()),
            size_bytes: html.len(),
            images: images.len(),
        });
    }

    let index = index_html(&summary.pages, opts.base_url.as_ref())?;
    write_atomic(&opts.site_dir, "index.html", &index)?;

    let manifest = serde_json::to_string_pretty(&SiteManifest {
        generated_at: Utc::now().to_rfc3339(),
        pages: &summary.pages,
    })
    .map_err(|e| NewsRelayError::validation(format!("failed to serialize site manifest: {e}")))?;
    write_atomic(&opts.site_dir, "manifest.json", &manifest)?;

    info!(
        pages = summary.pages.len(),
        skipped = summary.skipped.len(),
        "site rendered"
    );
    Ok(summary)
}

/// Copy existing media into the images directory; returns page-relative paths.
fn copy_media(media: &[PathBuf], images_dir: &Path) -> Result<Vec<String>> {
    let mut copied = Vec::new();
    for src in media {
        let Some(name) = src.file_name() else {
            continue;
        };
        if !src.exists() {
            warn!(path = %src.display(), "media file missing");
            continue;
        }
        let dest = images_dir.join(name);
        std::fs::copy(src, &dest).map_err(|e| NewsRelayError::io(&dest, e))?;
        copied.push(format!("./{IMAGES_DIR}/{}", name.to_string_lossy()));
    }
    Ok(copied)
}

fn page_html(title: &str, images: &[String], cta_url: &str) -> String {
    let title = escape_html(title);
    let href = escape_html(cta_url);

    let gallery: String = images
        .iter()
        .map(|src| {
            let img = format!(r#"<img src="{}" alt="{title}" loading="lazy">"#, escape_html(src));
            if href.is_empty() {
                format!("      <div class=\"card\">{img}</div>\n")
            } else {
                format!("      <a class=\"card\" href=\"{href}\">{img}</a>\n")
            }
        })
        .collect();

    let action = if href.is_empty() {
        String::new()
    } else {
        format!("    <a class=\"cta\" href=\"{href}\">Read the full story</a>\n")
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
    body {{ margin: 0; background: #000; color: #fff; font-family: -apple-system, "Segoe UI", Roboto, sans-serif; }}
    .container {{ max-width: 480px; margin: 0 auto; background: #1a1a1a; min-height: 100vh; padding-bottom: 90px; }}
    h1 {{ font-size: 1.3rem; color: #ffeb3b; padding: 15px; margin: 0; text-align: center; }}
    .gallery {{ display: flex; flex-direction: column; gap: 15px; padding: 10px; }}
    .card img {{ width: 100%; display: block; border-radius: 8px; }}
    .cta {{ position: fixed; bottom: 20px; left: 20px; right: 20px; max-width: 440px; margin: 0 auto;
            display: block; padding: 18px; text-align: center; font-weight: bold; color: #fff;
            background: linear-gradient(90deg, #ff0050, #00f2ea); border-radius: 30px; text-decoration: none; }}
  </style>
</head>
<body>
  <div class="container">
    <h1>{title}</h1>
    <div class="gallery">
{gallery}    </div>
{action}  </div>
</body>
</html>
"#
    )
}

fn index_html(pages: &[PageMeta], base_url: Option<&Url>) -> Result<String> {
    let mut rows = String::new();
    for page in pages {
        let link = match base_url {
            Some(base) => artifact_url(base, &page.id)?.to_string(),
            None => format!("./{}", page.file_name),
        };
        let link = escape_html(&link);
        rows.push_str(&format!(
            "    <li><a href=\"{link}\">{}</a><br><code>{link}</code></li>\n",
            escape_html(&page.title)
        ));
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <title>newsrelay pages</title>
</head>
<body>
  <h1>Pages ({count})</h1>
  <ul>
{rows}  </ul>
</body>
</html>
"#,
        count = pages.len()
    ))
}

fn write_atomic(dir: &Path, file_name: &str, content: &str) -> Result<()> {
    let target = dir.join(file_name);
    let temp = dir.join(format!(".{file_name}.tmp"));
    std::fs::write(&temp, content).map_err(|e| NewsRelayError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| NewsRelayError::io(&target, e))?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use newsrelay_shared::{Classification, ComposedCopy};
    use uuid::Uuid;

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nr_site_{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn composed_item(media: Vec<PathBuf>, title: &str) -> WorkItem {
        let mut item = WorkItem::detected(
            "feed",
            format!("https://example.com/{}", Uuid::now_v7()),
            "Article title",
            Classification {
                subjects: vec!["Alice".into()],
                topic: "t".into(),
            },
        );
        item.acquire_media(media).unwrap();
        item.compose(ComposedCopy {
            title: title.into(),
            short_text: "teaser".into(),
        })
        .unwrap();
        item
    }

    #[test]
    fn escape_html_covers_specials() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn artifact_url_adds_trailing_slash() {
        let id: ItemId = "0192f1a0-0000-7000-8000-000000000000".parse().unwrap();
        let base = Url::parse("https://user.github.io/site").unwrap();
        assert_eq!(
            artifact_url(&base, &id).unwrap().as_str(),
            "https://user.github.io/site/0192f1a0-0000-7000-8000-000000000000.html"
        );
        let base = Url::parse("https://user.github.io/site/").unwrap();
        assert_eq!(
            artifact_url(&base, &id).unwrap().as_str(),
            "https://user.github.io/site/0192f1a0-0000-7000-8000-000000000000.html"
        );
    }

    #[test]
    fn renders_pages_index_and_manifest() {
        let root = temp_dir();
        let media = root.join("media");
        std::fs::create_dir_all(&media).unwrap();
        std::fs::write(media.join("a_1.jpg"), b"jpeg-bytes").unwrap();

        let rendered = composed_item(vec![media.join("a_1.jpg")], "Alice <live> & loud");
        let missing = composed_item(vec![media.join("gone.jpg")], "Missing");
        let detected = WorkItem::detected("feed", "https://example.com/x", "t", Classification::default());

        let opts = SiteOptions {
            site_dir: root.join("site"),
            call_to_action_url: "https://partner.example/?ref=1&b=2".into(),
            base_url: Some(Url::parse("https://user.github.io/site/").unwrap()),
        };
        let summary = render_site(&[rendered.clone(), missing.clone(), detected], &opts).unwrap();

        assert_eq!(summary.pages.len(), 1);
        assert_eq!(summary.skipped, vec![missing.id]);

        let page = std::fs::read_to_string(opts.site_dir.join(page_file_name(&rendered.id))).unwrap();
        assert!(page.contains("Alice &lt;live&gt; &amp; loud"));
        assert!(page.contains("./images/a_1.jpg"));
        assert!(page.contains("https://partner.example/?ref=1&amp;b=2"));
        assert!(opts.site_dir.join("images/a_1.jpg").exists());

        let index = std::fs::read_to_string(opts.site_dir.join("index.html")).unwrap();
        assert!(index.contains(&format!("https://user.github.io/site/{}.html", rendered.id)));

        let manifest = std::fs::read_to_string(opts.site_dir.join("manifest.json")).unwrap();
        assert!(manifest.contains(&summary.pages[0].sha256));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn index_without_base_url_uses_relative_links() {
        let root = temp_dir();
        std::fs::write(root.join("b.jpg"), b"x").unwrap();
        let item = composed_item(vec![root.join("b.jpg")], "Bob");

        let opts = SiteOptions {
            site_dir: root.join("site"),
            call_to_action_url: String::new(),
            base_url: None,
        };
        render_site(&[item.clone()], &opts).unwrap();

        let index = std::fs::read_to_string(opts.site_dir.join("index.html")).unwrap();
        assert!(index.contains(&format!("./{}.html", item.id)));
        let page = std::fs::read_to_string(opts.site_dir.join(page_file_name(&item.id))).unwrap();
        assert!(!page.contains("class=\"cta\""));

        let _ = std::fs::remove_dir_all(&root);
    }
}
