use crate::error::BvrError;
use crate::Result;

/// Coordinate convention of a box row of four values.
///
/// Corner formats store two corners, `xywh` stores the top left corner plus size and the
/// `center_*` formats store the center plus size. `rel_*` formats hold coordinates
/// normalized by the image width (x) and height (y).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxFormat {
    #[default] Xyxy,
    Yxyx,
    Xywh,
    CenterXywh,
    CenterYxhw,
    RelXyxy,
    RelYxyx,
    RelXywh,
}

// Names accepted by `from_str`, lowercase.
const XYXY: &str = "xyxy";
const YXYX: &str = "yxyx";
const XYWH: &str = "xywh";
const CENTER_XYWH: &str = "center_xywh";
const CENTER_YXHW: &str = "center_yxhw";
const REL_XYXY: &str = "rel_xyxy";
const REL_YXYX: &str = "rel_yxyx";
const REL_XYWH: &str = "rel_xywh";

impl BoxFormat {
    pub fn from_str(format: &str) -> Result<Self> {
        match format.trim().to_lowercase().as_str() {
            XYXY => Ok(BoxFormat::Xyxy),
            YXYX => Ok(BoxFormat::Yxyx),
            XYWH => Ok(BoxFormat::Xywh),
            CENTER_XYWH => Ok(BoxFormat::CenterXywh),
            CENTER_YXHW => Ok(BoxFormat::CenterYxhw),
            REL_XYXY => Ok(BoxFormat::RelXyxy),
            REL_YXYX => Ok(BoxFormat::RelYxyx),
            REL_XYWH => Ok(BoxFormat::RelXywh),
            _ => Err(BvrError::InvalidEncoding(format!(
                "`{}`, expected one of: {}",
                format,
                BoxFormat::all_box_formats().join(", ")
            ))),
        }
    }

    pub fn str(&self) -> &'static str {
        match self {
            BoxFormat::Xyxy => XYXY,
            BoxFormat::Yxyx => YXYX,
            BoxFormat::Xywh => XYWH,
            BoxFormat::CenterXywh => CENTER_XYWH,
            BoxFormat::CenterYxhw => CENTER_YXHW,
            BoxFormat::RelXyxy => REL_XYXY,
            BoxFormat::RelYxyx => REL_YXYX,
            BoxFormat::RelXywh => REL_XYWH,
        }
    }

    pub fn all_box_formats() -> Vec<String> {
        [
            BoxFormat::Xyxy,
            BoxFormat::Yxyx,
            BoxFormat::Xywh,
            BoxFormat::CenterXywh,
            BoxFormat::CenterYxhw,
            BoxFormat::RelXyxy,
            BoxFormat::RelYxyx,
            BoxFormat::RelXywh,
        ]
        .iter()
        .map(|f| f.str().to_string())
        .collect()
    }

    pub fn is_valid_box_format(format: &str) -> bool {
        BoxFormat::from_str(format).is_ok()
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, BoxFormat::RelXyxy | BoxFormat::RelYxyx | BoxFormat::RelXywh)
    }

    /// The absolute format sharing this format's coordinate layout.
    pub fn absolute(&self) -> Self {
        match self {
            BoxFormat::RelXyxy => BoxFormat::Xyxy,
            BoxFormat::RelYxyx => BoxFormat::Yxyx,
            BoxFormat::RelXywh => BoxFormat::Xywh,
            other => *other,
        }
    }

    /// Re-arranges one row into `[y_min, x_min, y_max, x_max]` without any scaling.
    pub fn to_yxyx(&self, b: [f32; 4]) -> [f32; 4] {
        match self.absolute() {
            BoxFormat::Xyxy => [b[1], b[0], b[3], b[2]],
            BoxFormat::Yxyx => b,
            BoxFormat::Xywh => [b[1], b[0], b[1] + b[3], b[0] + b[2]],
            BoxFormat::CenterXywh => {
                let (cx, cy, w, h) = (b[0], b[1], b[2], b[3]);
                [cy - h / 2., cx - w / 2., cy + h / 2., cx + w / 2.]
            }
            BoxFormat::CenterYxhw => {
                let (cy, cx, h, w) = (b[0], b[1], b[2], b[3]);
                [cy - h / 2., cx - w / 2., cy + h / 2., cx + w / 2.]
            }
            // absolute() never yields a relative format
            BoxFormat::RelXyxy | BoxFormat::RelYxyx | BoxFormat::RelXywh => b,
        }
    }

    /// Inverse of [`BoxFormat::to_yxyx`].
    pub fn from_yxyx(&self, b: [f32; 4]) -> [f32; 4] {
        let (y1, x1, y2, x2) = (b[0], b[1], b[2], b[3]);
        match self.absolute() {
            BoxFormat::Xyxy => [x1, y1, x2, y2],
            BoxFormat::Yxyx => b,
            BoxFormat::Xywh => [x1, y1, x2 - x1, y2 - y1],
            BoxFormat::CenterXywh => [(x1 + x2) / 2., (y1 + y2) / 2., x2 - x1, y2 - y1],
            BoxFormat::CenterYxhw => [(y1 + y2) / 2., (x1 + x2) / 2., y2 - y1, x2 - x1],
            BoxFormat::RelXyxy | BoxFormat::RelYxyx | BoxFormat::RelXywh => b,
        }
    }
}

impl std::fmt::Display for BoxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.str())
    }
}
