//! COCO-style per-video annotation file
//!
//! Each labelled video ships a `label.json` with `categories`, `images` and
//! `annotations` arrays. Image ids are frame indices; boxes are pixel
//! `[x_min, y_min, width, height]`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::DatasetError;
use crate::utils::read_and_parse_json;

/// COCO category information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub supercategory: Option<String>,
}

/// COCO image information, one entry per annotated frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// COCO annotation information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub id: Option<u64>,
    pub image_id: u32,
    pub category_id: u32,
    pub bbox: [f64; 4],
}

/// Complete annotation file for one video
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CocoFile {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl CocoFile {
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        read_and_parse_json(path)
    }

    /// Map COCO category ids onto training class ids by category name.
    ///
    /// Categories without a class id are left out and reported in the second value.
    pub fn class_id_lookup(
        &self,
        class_ids: &HashMap<String, usize>,
    ) -> (HashMap<u32, usize>, Vec<String>) {
        let mut lookup = HashMap::with_capacity(self.categories.len());
        let mut unmapped = Vec::new();
        for category in &self.categories {
            match class_ids.get(&category.name) {
                Some(&class_id) => {
                    lookup.insert(category.id, class_id);
                }
                None => unmapped.push(category.name.clone()),
            }
        }
        (lookup, unmapped)
    }

    pub fn images_by_id(&self) -> HashMap<u32, &Image> {
        self.images.iter().map(|image| (image.id, image)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_file() {
        let json = r#"{
            "categories": [{"id": 1, "name": "Handgun"}, {"id": 2, "name": "Knife"}],
            "images": [{"id": 0, "width": 640, "height": 480}],
            "annotations": [{"image_id": 0, "category_id": 1, "bbox": [10, 20, 30, 40]}]
        }"#;
        let file: CocoFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.annotations[0].bbox, [10.0, 20.0, 30.0, 40.0]);

        let class_ids = HashMap::from([("Handgun".to_string(), 0)]);
        let (lookup, unmapped) = file.class_id_lookup(&class_ids);
        assert_eq!(lookup.get(&1), Some(&0));
        assert_eq!(unmapped, vec!["Knife".to_string()]);
    }
}
