//! Runtime image handles.
//!
//! Image elements persist their pixels as a base64 string or `data:` URI.
//! Decoded images are runtime state: they never enter a history snapshot,
//! and after any wholesale element swap (undo, redo, template load) the
//! session calls [`ImageCache::sync`] to rebuild them.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use image::DynamicImage;

use crate::element::{Element, ElementId, ElementKind};
use crate::error::{LabelError, LabelResult};

/// Decode an element `src`: a `data:` URI or bare base64.
pub fn decode_src(src: &str) -> LabelResult<DynamicImage> {
    let src = src.trim();
    let encoded = match src.strip_prefix("data:") {
        Some(uri) => {
            let (meta, data) = uri
                .split_once(',')
                .ok_or_else(|| LabelError::Image("invalid data URI: missing comma".into()))?;
            if !meta.contains(";base64") {
                return Err(LabelError::Image(format!("unsupported data URI encoding: {}", meta)));
            }
            data
        }
        None => src,
    };
    if encoded.is_empty() {
        return Err(LabelError::Image("empty image source".into()));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| LabelError::Image(format!("failed to decode base64: {}", e)))?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Encode an image as a PNG data URI.
pub fn encode_data_uri(img: &DynamicImage) -> LabelResult<String> {
    let mut png_bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png_bytes), image::ImageFormat::Png)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png_bytes)
    ))
}

#[derive(Debug, Clone)]
struct Handle {
    src: String,
    image: Option<Arc<DynamicImage>>,
}

/// Decoded images keyed by element id.
#[derive(Debug, Default, Clone)]
pub struct ImageCache {
    handles: HashMap<ElementId, Handle>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the cache in line with `elements` (group children included).
    ///
    /// Unchanged sources keep their handle; changed ones are re-decoded;
    /// handles for vanished elements are dropped. Undecodable sources are
    /// remembered as failed so they are not retried every sync.
    pub fn sync(&mut self, elements: &[Element]) {
        let mut live: HashMap<ElementId, &str> = HashMap::new();
        for el in elements {
            el.walk(&mut |e| {
                if let ElementKind::Image(props) = &e.kind {
                    live.insert(e.id.clone(), props.src.as_str());
                }
            });
        }

        self.handles.retain(|id, h| live.get(id).is_some_and(|src| *src == h.src));

        for (id, src) in live {
            if self.handles.contains_key(&id) {
                continue;
            }
            let image = match decode_src(src) {
                Ok(img) => Some(Arc::new(img)),
                Err(e) => {
                    tracing::warn!("image {}: {}", id, e);
                    None
                }
            };
            self.handles.insert(
                id,
                Handle {
                    src: src.to_string(),
                    image,
                },
            );
        }
    }

    /// Decoded image for an element, if it decoded.
    pub fn get(&self, id: &ElementId) -> Option<Arc<DynamicImage>> {
        self.handles.get(id).and_then(|h| h.image.clone())
    }

    /// Whether the element's source failed to decode.
    pub fn is_broken(&self, id: &ElementId) -> bool {
        self.handles.get(id).is_some_and(|h| h.image.is_none())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ImageProps;
    use image::{GrayImage, Luma};

    fn sample_uri(w: u32, h: u32) -> String {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, Luma([128u8])));
        encode_data_uri(&img).unwrap()
    }

    fn image_element(id: &str, src: String) -> Element {
        Element::new(ElementKind::Image(ImageProps { src })).with_id(id)
    }

    #[test]
    fn test_decode_data_uri_and_bare_base64() {
        let uri = sample_uri(3, 2);
        let img = decode_src(&uri).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));

        let bare = uri.split_once(',').unwrap().1.to_string();
        assert_eq!(decode_src(&bare).unwrap().width(), 3);
    }

    #[test]
    fn test_decode_errors() {
        assert!(decode_src("").is_err());
        assert!(decode_src("data:image/png,rawbytes").is_err());
        assert!(decode_src("data:image/png;base64").is_err());
        assert!(decode_src("!!!not base64!!!").is_err());
    }

    #[test]
    fn test_sync_tracks_elements() {
        let mut cache = ImageCache::new();
        let a = image_element("a", sample_uri(4, 4));
        let b = image_element("b", "broken".into());
        cache.sync(&[a.clone(), b, Element::text("t")]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&a.id).unwrap().width(), 4);
        assert!(cache.is_broken(&ElementId::from("b")));

        let before = cache.get(&a.id).unwrap();
        cache.sync(&[a.clone()]);
        assert_eq!(cache.len(), 1);
        // Unchanged source keeps the same handle
        assert!(Arc::ptr_eq(&before, &cache.get(&a.id).unwrap()));

        let a2 = image_element("a", sample_uri(8, 2));
        cache.sync(&[a2]);
        assert_eq!(cache.get(&a.id).unwrap().width(), 8);
    }
}
