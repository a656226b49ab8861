use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Keypoints del formato COCO (nariz, ojos, orejas, hombros, codos, muñecas,
/// caderas, rodillas, tobillos).
pub const NUM_KEYPOINTS: usize = 17;

/// Pares de keypoints que forman el esqueleto COCO-Pose.
pub const SKELETON: [[usize; 2]; 19] = [
    [15, 13],
    [13, 11],
    [16, 14],
    [14, 12],
    [11, 12],
    [5, 11],
    [6, 12],
    [5, 6],
    [5, 7],
    [6, 8],
    [7, 9],
    [8, 10],
    [1, 2],
    [0, 1],
    [0, 2],
    [1, 3],
    [2, 4],
    [3, 5],
    [4, 6],
];

/// Índices en `POSE_PALETTE` para cada extremidad y cada keypoint
/// (brazos azul, piernas naranja, cara verde sobre el buffer BGR).
pub const LIMB_COLOR_INDICES: [usize; 19] = [
    9, 9, 9, 9, 7, 7, 7, 0, 0, 0, 0, 0, 16, 16, 16, 16, 16, 16, 16,
];
pub const KPT_COLOR_INDICES: [usize; NUM_KEYPOINTS] =
    [16, 16, 16, 16, 16, 0, 0, 0, 0, 0, 0, 9, 9, 9, 9, 9, 9];

/// Paleta de pose de Ultralytics. Se escribe tal cual en el buffer BGR.
pub const POSE_PALETTE: [[u8; 3]; 20] = [
    [255, 128, 0],
    [255, 153, 51],
    [255, 178, 102],
    [230, 230, 0],
    [255, 153, 255],
    [153, 204, 255],
    [255, 102, 255],
    [255, 51, 255],
    [102, 178, 255],
    [51, 153, 255],
    [255, 153, 153],
    [255, 102, 102],
    [255, 51, 51],
    [153, 255, 153],
    [102, 255, 102],
    [51, 255, 51],
    [0, 255, 0],
    [0, 0, 255],
    [255, 0, 0],
    [255, 255, 255],
];

/// Los modelos de pose sólo tienen una clase.
pub const PERSON_LABEL: &str = "person";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
}

impl Pose {
    pub fn label(&self) -> &'static str {
        PERSON_LABEL
    }
}

/// Resultado de inferencia para una imagen de entrada.
#[derive(Debug, Clone)]
pub struct PoseResult {
    pub orig_img: RgbImage,
    pub poses: Vec<Pose>,
    pub infer_ms: f32,
}

impl PoseResult {
    pub fn summary(&self) -> String {
        match self.poses.len() {
            0 => "sin detecciones".to_string(),
            1 => format!("1 {PERSON_LABEL}"),
            n => format!("{n} {PERSON_LABEL}s"),
        }
    }
}
