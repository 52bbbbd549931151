use log::{debug, warn};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::coco::CocoFile;
use crate::error::DatasetError;
use crate::utils::frame_file_name;

/// Pixel bounding box: top-left corner plus width and height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub x_min: f64,
    pub y_min: f64,
    pub width: f64,
    pub height: f64,
}

impl From<[f64; 4]> for PixelBox {
    fn from(bbox: [f64; 4]) -> Self {
        Self {
            x_min: bbox[0],
            y_min: bbox[1],
            width: bbox[2],
            height: bbox[3],
        }
    }
}

/// Bounding box in YOLO's normalized center/size coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

fn check_image_size(image_width: u32, image_height: u32) -> Result<(), DatasetError> {
    if image_width == 0 || image_height == 0 {
        return Err(DatasetError::InvalidImageSize {
            width: image_width,
            height: image_height,
        });
    }
    Ok(())
}

/// Convert a pixel box to normalized YOLO coordinates
pub fn to_normalized(
    bbox: PixelBox,
    image_width: u32,
    image_height: u32,
) -> Result<YoloBox, DatasetError> {
    check_image_size(image_width, image_height)?;
    let w = image_width as f64;
    let h = image_height as f64;

    Ok(YoloBox {
        x_center: (bbox.x_min + bbox.width / 2.0) / w,
        y_center: (bbox.y_min + bbox.height / 2.0) / h,
        width: bbox.width / w,
        height: bbox.height / h,
    })
}

/// Inverse of [`to_normalized`]
pub fn from_normalized(
    bbox: YoloBox,
    image_width: u32,
    image_height: u32,
) -> Result<PixelBox, DatasetError> {
    check_image_size(image_width, image_height)?;
    let w = image_width as f64;
    let h = image_height as f64;
    let width = bbox.width * w;
    let height = bbox.height * h;

    Ok(PixelBox {
        x_min: bbox.x_center * w - width / 2.0,
        y_min: bbox.y_center * h - height / 2.0,
        width,
        height,
    })
}

/// Format one YOLO label line
pub fn format_label_line(class_id: usize, bbox: &YoloBox) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}\n",
        class_id, bbox.x_center, bbox.y_center, bbox.width, bbox.height
    )
}

/// Convert a COCO annotation file into YOLO label lines, keyed by frame index.
///
/// Annotations pointing at unknown images or unmapped categories are skipped.
pub fn convert_to_yolo_format(
    coco: &CocoFile,
    class_ids: &HashMap<String, usize>,
) -> BTreeMap<u32, String> {
    let (class_lookup, unmapped) = coco.class_id_lookup(class_ids);
    for name in &unmapped {
        warn!("No class id for annotation category '{}', skipping its boxes", name);
    }
    let images = coco.images_by_id();

    let mut frames: BTreeMap<u32, String> = BTreeMap::new();
    for annotation in &coco.annotations {
        let Some(image) = images.get(&annotation.image_id) else {
            warn!("Annotation references unknown image id {}", annotation.image_id);
            continue;
        };
        let Some(&class_id) = class_lookup.get(&annotation.category_id) else {
            continue;
        };
        match to_normalized(annotation.bbox.into(), image.width, image.height) {
            Ok(bbox) => frames
                .entry(image.id)
                .or_default()
                .push_str(&format_label_line(class_id, &bbox)),
            Err(e) => warn!("Skipping annotation on frame {}: {}", image.id, e),
        }
    }
    frames
}

/// Write one label file next to each extracted frame.
///
/// Frames whose image was not extracted get no label file. Returns the number of
/// label files written.
pub fn convert_labels_json(
    json_path: &Path,
    frame_folder: &Path,
    class_ids: &HashMap<String, usize>,
) -> Result<usize, DatasetError> {
    let coco = CocoFile::load(json_path)?;
    let frames = convert_to_yolo_format(&coco, class_ids);

    let mut written = 0;
    for (frame_index, yolo_data) in frames {
        let frame_file = frame_folder.join(frame_file_name(frame_index, "jpg"));
        if !frame_file.exists() {
            debug!("No extracted frame for {:?}, skipping label", frame_file);
            continue;
        }
        let label_path = frame_file.with_extension("txt");
        let file = File::create(&label_path).map_err(|e| DatasetError::io(&label_path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(yolo_data.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| DatasetError::io(&label_path, e))?;
        written += 1;
    }
    Ok(written)
}
