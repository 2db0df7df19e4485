// src/statement/assets.rs

//! Image relocation and embed conversion in assembled statement markup
//!
//! Raster images referenced by the statement are copied into the problem's
//! attachment directory and their references rewritten with the attachment
//! URL prefix and the fixed presentational style. Embedded vector/legacy
//! objects are rendered to PNG through the external raster converter and
//! the embed node is replaced in place by an equivalent image node. A
//! document without images or embeds passes through unchanged.

use crate::convert::Converter;
use crate::error::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use rand::Rng;
use std::fs;
use std::path::Path;
use tracing::warn;

/// URL prefix prepended to rewritten image references
pub const ATTACHMENT_URL_PREFIX: &str = "attachments/";

/// Presentational style applied to every rewritten image
pub const IMG_STYLE: &str = "max-width: 100%; height: auto;";

/// Rewrites image assets in statement markup
pub struct AssetRewriter<'a> {
    raster: &'a dyn Converter,
    url_prefix: &'a str,
}

impl<'a> AssetRewriter<'a> {
    pub fn new(raster: &'a dyn Converter) -> Self {
        Self {
            raster,
            url_prefix: ATTACHMENT_URL_PREFIX,
        }
    }

    pub fn with_url_prefix(mut self, url_prefix: &'a str) -> Self {
        self.url_prefix = url_prefix;
        self
    }

    /// Relocate images and convert embeds, returning the mutated markup
    ///
    /// Markup that does not parse is returned unchanged with a warning;
    /// individual copy failures are tolerated and the reference is
    /// rewritten regardless.
    pub fn rewrite(
        &self,
        markup: &str,
        source_dir: &Path,
        attachment_dir: &Path,
    ) -> Result<String> {
        let mut reader = Reader::from_str(markup);
        let mut writer = Writer::new(Vec::new());
        let mut embed_depth = 0usize;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    warn!("statement markup does not parse, leaving assets as-is: {e}");
                    return Ok(markup.to_string());
                }
            };
            match event {
                Event::Eof => break,
                Event::Start(e) if e.name().as_ref() == b"img" => {
                    let img = self.rewrite_img(&e, source_dir, attachment_dir);
                    writer.write_event(Event::Start(img))?;
                }
                Event::Empty(e) if e.name().as_ref() == b"img" => {
                    let img = self.rewrite_img(&e, source_dir, attachment_dir);
                    writer.write_event(Event::Empty(img))?;
                }
                Event::Empty(e) if e.name().as_ref() == b"embed" => {
                    let img = self.convert_embed(&e, source_dir, attachment_dir);
                    writer.write_event(Event::Empty(img))?;
                }
                Event::Start(e) if e.name().as_ref() == b"embed" => {
                    embed_depth += 1;
                    let img = self.convert_embed(&e, source_dir, attachment_dir);
                    writer.write_event(Event::Empty(img))?;
                }
                Event::End(e) if e.name().as_ref() == b"embed" && embed_depth > 0 => {
                    embed_depth -= 1;
                }
                // Content nested inside an embed is dropped with it
                _ if embed_depth > 0 => {}
                other => writer.write_event(other)?,
            }
        }

        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Copy the referenced file and rewrite the reference
    fn rewrite_img(
        &self,
        tag: &BytesStart<'_>,
        source_dir: &Path,
        attachment_dir: &Path,
    ) -> BytesStart<'static> {
        let mut rewritten = BytesStart::new("img");
        let mut has_style = false;
        for attr in tag.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            match key.as_str() {
                "src" => {
                    if let Err(e) =
                        fs::copy(source_dir.join(&value), attachment_dir.join(&value))
                    {
                        warn!("cannot copy statement image {value}: {e}");
                    }
                    rewritten
                        .push_attribute(("src", format!("{}{value}", self.url_prefix).as_str()));
                }
                "style" => {
                    has_style = true;
                    rewritten.push_attribute(("style", IMG_STYLE));
                }
                _ => rewritten.push_attribute((key.as_str(), value.as_str())),
            }
        }
        if !has_style {
            rewritten.push_attribute(("style", IMG_STYLE));
        }
        rewritten
    }

    /// Render the embed source to PNG and build the replacement image node
    fn convert_embed(
        &self,
        tag: &BytesStart<'_>,
        source_dir: &Path,
        attachment_dir: &Path,
    ) -> BytesStart<'static> {
        let source = tag
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == b"src")
            .map(|a| String::from_utf8_lossy(&a.value).into_owned())
            .unwrap_or_default();

        let name = format!("{}.png", random_digits(10));
        if source.is_empty() {
            warn!("embed without src attribute, emitting empty image");
        } else if let Err(e) = self
            .raster
            .convert(&source_dir.join(&source), &attachment_dir.join(&name))
        {
            warn!("cannot rasterize embedded image {source}: {e}");
        }

        let mut img = BytesStart::new("img");
        img.push_attribute(("src", format!("{}{name}", self.url_prefix).as_str()));
        img.push_attribute(("style", IMG_STYLE));
        img
    }
}

fn random_digits(count: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    /// Raster converter that records a marker file
    struct FakeRaster;

    impl Converter for FakeRaster {
        fn convert(&self, input: &Path, output: &Path) -> Result<()> {
            let data = fs::read(input)?;
            fs::write(output, data)?;
            Ok(())
        }
    }

    struct BrokenRaster;

    impl Converter for BrokenRaster {
        fn convert(&self, _input: &Path, _output: &Path) -> Result<()> {
            Err(Error::Converter("simulated".into()))
        }
    }

    #[test]
    fn rewrites_img_reference_and_copies_file() {
        let source = TempDir::new().unwrap();
        let attach = TempDir::new().unwrap();
        fs::write(source.path().join("pic.png"), b"png-bytes").unwrap();

        let rewriter = AssetRewriter::new(&FakeRaster);
        let markup = "<problem><img src=\"pic.png\"/></problem>";
        let result = rewriter
            .rewrite(markup, source.path(), attach.path())
            .unwrap();

        assert!(result.contains("src=\"attachments/pic.png\""));
        assert!(result.contains(IMG_STYLE));
        assert!(attach.path().join("pic.png").exists());
    }

    #[test]
    fn missing_image_file_is_tolerated_but_reference_rewritten() {
        let source = TempDir::new().unwrap();
        let attach = TempDir::new().unwrap();

        let rewriter = AssetRewriter::new(&FakeRaster);
        let markup = "<p><img src=\"absent.png\"/></p>";
        let result = rewriter
            .rewrite(markup, source.path(), attach.path())
            .unwrap();

        assert!(result.contains("src=\"attachments/absent.png\""));
    }

    #[test]
    fn embed_becomes_converted_image() {
        let source = TempDir::new().unwrap();
        let attach = TempDir::new().unwrap();
        fs::write(source.path().join("fig.eps"), b"eps").unwrap();

        let rewriter = AssetRewriter::new(&FakeRaster);
        let markup = "<p><embed src=\"fig.eps\"/></p>";
        let result = rewriter
            .rewrite(markup, source.path(), attach.path())
            .unwrap();

        assert!(!result.contains("<embed"));
        assert!(result.contains("<img src=\"attachments/"));
        assert!(result.contains(".png\""));
        // exactly one generated png landed in the attachment dir
        let generated: Vec<_> = fs::read_dir(attach.path()).unwrap().collect();
        assert_eq!(generated.len(), 1);
    }

    #[test]
    fn embed_with_end_tag_is_fully_replaced() {
        let source = TempDir::new().unwrap();
        let attach = TempDir::new().unwrap();
        fs::write(source.path().join("fig.eps"), b"eps").unwrap();

        let rewriter = AssetRewriter::new(&FakeRaster);
        let markup = "<p><embed src=\"fig.eps\">fallback</embed>tail</p>";
        let result = rewriter
            .rewrite(markup, source.path(), attach.path())
            .unwrap();

        assert!(!result.contains("<embed"));
        assert!(!result.contains("fallback"));
        assert!(result.contains("tail"));
    }

    #[test]
    fn raster_failure_still_replaces_the_node() {
        let source = TempDir::new().unwrap();
        let attach = TempDir::new().unwrap();
        fs::write(source.path().join("fig.eps"), b"eps").unwrap();

        let rewriter = AssetRewriter::new(&BrokenRaster);
        let markup = "<p><embed src=\"fig.eps\"/></p>";
        let result = rewriter
            .rewrite(markup, source.path(), attach.path())
            .unwrap();

        assert!(!result.contains("<embed"));
        assert!(result.contains("<img"));
    }

    #[test]
    fn markup_without_assets_passes_through() {
        let source = TempDir::new().unwrap();
        let attach = TempDir::new().unwrap();

        let rewriter = AssetRewriter::new(&FakeRaster);
        let markup = "<problem><statement language=\"ru_RU\"><description>text</description></statement></problem>";
        let result = rewriter
            .rewrite(markup, source.path(), attach.path())
            .unwrap();
        assert_eq!(result, markup);
    }

    #[test]
    fn existing_style_attribute_is_overridden() {
        let source = TempDir::new().unwrap();
        let attach = TempDir::new().unwrap();
        fs::write(source.path().join("pic.png"), b"png").unwrap();

        let rewriter = AssetRewriter::new(&FakeRaster);
        let markup = "<p><img src=\"pic.png\" style=\"float: left\" alt=\"x\"/></p>";
        let result = rewriter
            .rewrite(markup, source.path(), attach.path())
            .unwrap();

        assert!(!result.contains("float: left"));
        assert!(result.contains(IMG_STYLE));
        assert!(result.contains("alt=\"x\""));
    }
}
