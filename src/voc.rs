//! Pascal VOC annotations and their conversion to YOLO label lines.

use log::warn;
use std::fs;
use std::path::Path;
use xml::reader::{EventReader, XmlEvent};

use crate::error::AnnotationError;

/// One XML element with its concatenated text and child elements.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// First descendant along a `/` separated path of child names
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/').try_fold(self, |element, name| {
            element.children.iter().find(|child| child.name == name)
        })
    }

    /// Direct children with the given name, in document order
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Trimmed text of the element at `path`, parsed as a number
    pub fn number(&self, path: &str) -> Option<f64> {
        self.find(path)?.text.trim().parse().ok()
    }
}

/// Build the element tree of a whole document.
///
/// Fails on anything that is not well-formed, including unclosed tags.
pub fn parse_element_tree(xml: &str) -> Result<Element, String> {
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    for event in EventReader::new(xml.as_bytes()) {
        match event.map_err(|e| e.to_string())? {
            XmlEvent::StartElement { name, .. } => stack.push(Element {
                name: name.local_name,
                ..Element::default()
            }),
            XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            XmlEvent::EndElement { .. } => {
                let element = stack.pop().ok_or("unbalanced end tag")?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

/// The parts of a VOC document needed for detection labels.
#[derive(Debug, Clone, PartialEq)]
pub struct VocAnnotation {
    pub size: Option<VocSize>,
    pub objects: Vec<VocObject>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VocSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocObject {
    pub name: Option<String>,
    pub bndbox: Option<VocBndBox>,
}

// A coordinate that is absent, empty or not a number is None
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VocBndBox {
    pub xmin: Option<f64>,
    pub ymin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymax: Option<f64>,
}

impl VocAnnotation {
    pub fn from_element(root: &Element) -> Self {
        let size = match (root.number("size/width"), root.number("size/height")) {
            (Some(width), Some(height)) => Some(VocSize { width, height }),
            _ => None,
        };
        let objects = root
            .find_all("object")
            .map(|object| VocObject {
                name: object.find("name").map(|name| name.text.trim().to_string()),
                bndbox: object.find("bndbox").map(|bndbox| VocBndBox {
                    xmin: bndbox.number("xmin"),
                    ymin: bndbox.number("ymin"),
                    xmax: bndbox.number("xmax"),
                    ymax: bndbox.number("ymax"),
                }),
            })
            .collect();
        Self { size, objects }
    }
}

/// Corner coordinates of a box in absolute pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Box center and size as fractions of the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl VocBndBox {
    fn to_pixel_box(&self) -> Option<PixelBox> {
        Some(PixelBox {
            xmin: self.xmin?,
            ymin: self.ymin?,
            xmax: self.xmax?,
            ymax: self.ymax?,
        })
    }
}

impl PixelBox {
    /// Swap corners given in the wrong order; coordinates are otherwise kept.
    pub fn ordered(&self) -> PixelBox {
        PixelBox {
            xmin: self.xmin.min(self.xmax),
            ymin: self.ymin.min(self.ymax),
            xmax: self.xmin.max(self.xmax),
            ymax: self.ymin.max(self.ymax),
        }
    }

    pub fn normalize(&self, image_width: f64, image_height: f64) -> NormalizedBox {
        NormalizedBox {
            x_center: (self.xmin + self.xmax) / 2.0 / image_width,
            y_center: (self.ymin + self.ymax) / 2.0 / image_height,
            width: (self.xmax - self.xmin) / image_width,
            height: (self.ymax - self.ymin) / image_height,
        }
    }
}

impl NormalizedBox {
    /// Inverse of [`PixelBox::normalize`]
    pub fn to_pixel_box(&self, image_width: f64, image_height: f64) -> PixelBox {
        let half_w = self.width * image_width / 2.0;
        let half_h = self.height * image_height / 2.0;
        let cx = self.x_center * image_width;
        let cy = self.y_center * image_height;
        PixelBox {
            xmin: cx - half_w,
            ymin: cy - half_h,
            xmax: cx + half_w,
            ymax: cy + half_h,
        }
    }

    /// One YOLO label line, newline included
    pub fn to_label_line(&self, class_id: usize) -> String {
        format!(
            "{} {:.6} {:.6} {:.6} {:.6}\n",
            class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// Parse a VOC XML document.
pub fn parse_voc(xml: &str, path: &Path) -> Result<VocAnnotation, AnnotationError> {
    let root = parse_element_tree(xml).map_err(|reason| AnnotationError::Malformed {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(VocAnnotation::from_element(&root))
}

/// Convert a parsed annotation into label lines for `class_id`.
///
/// Objects without a complete `bndbox` are skipped with a warning. A missing
/// or unreadable `size` block, or a non-positive image size, fails the whole
/// document.
pub fn convert_to_yolo_format(
    annotation: &VocAnnotation,
    class_id: usize,
    path: &Path,
) -> Result<String, AnnotationError> {
    let size = annotation.size.ok_or_else(|| AnnotationError::Malformed {
        path: path.to_path_buf(),
        reason: "missing size/width or size/height".to_string(),
    })?;
    if !(size.width > 0.0 && size.height > 0.0) {
        return Err(AnnotationError::Malformed {
            path: path.to_path_buf(),
            reason: format!("invalid image size {}x{}", size.width, size.height),
        });
    }

    let mut yolo_data = String::with_capacity(annotation.objects.len() * 48);
    for (index, object) in annotation.objects.iter().enumerate() {
        let pixel_box = match object.bndbox.as_ref().and_then(VocBndBox::to_pixel_box) {
            Some(pixel_box) => pixel_box,
            None => {
                warn!(
                    "Skipping object #{} ({}) in {}: incomplete bndbox",
                    index,
                    object.name.as_deref().unwrap_or("unnamed"),
                    path.display()
                );
                continue;
            }
        };

        let normalized = pixel_box.ordered().normalize(size.width, size.height);
        yolo_data.push_str(&normalized.to_label_line(class_id));
    }

    Ok(yolo_data)
}

/// Read an XML annotation from disk and produce its label file contents.
pub fn normalize(path: &Path, class_id: usize) -> Result<String, AnnotationError> {
    let xml = fs::read_to_string(path).map_err(|source| AnnotationError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let annotation = parse_voc(&xml, path)?;
    convert_to_yolo_format(&annotation, class_id, path)
}
