//! Postprocesado de la salida de YOLO-pose: decodificación, NMS y
//! conversión a coordenadas de la imagen original.

use anyhow::{bail, Result};
use ndarray::ArrayView2;

use super::preprocess::Letterbox;
use crate::domain::model::PredictParams;
use crate::domain::pose::{Keypoint, Pose, NUM_KEYPOINTS};

/// 4 (caja) + 1 (score) + 17 * 3 (keypoints)
pub const POSE_CHANNELS: usize = 5 + NUM_KEYPOINTS * 3;

/// Decodifica una salida `(56, N)` en poses ordenadas por score.
pub fn decode_poses(
    predictions: ArrayView2<f32>,
    letterbox: &Letterbox,
    params: &PredictParams,
) -> Result<Vec<Pose>> {
    let (channels, num_preds) = predictions.dim();
    if channels != POSE_CHANNELS {
        bail!("salida con {channels} canales, se esperaban {POSE_CHANNELS}");
    }

    let mut candidates: Vec<Pose> = Vec::new();
    for i in 0..num_preds {
        let score = predictions[[4, i]];
        // También descarta puntuaciones NaN.
        if !(score > params.conf_threshold) {
            continue;
        }

        let cx = predictions[[0, i]];
        let cy = predictions[[1, i]];
        let w = predictions[[2, i]];
        let h = predictions[[3, i]];

        let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
        for (k, kp) in keypoints.iter_mut().enumerate() {
            let base = 5 + k * 3;
            *kp = Keypoint::new(
                predictions[[base, i]],
                predictions[[base + 1, i]],
                predictions[[base + 2, i]],
            );
        }

        candidates.push(Pose {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            score,
            class_id: 0,
            keypoints,
        });
    }

    let mut kept = non_max_suppression(candidates, params.iou_threshold);
    kept.truncate(params.max_detections);

    Ok(kept.into_iter().map(|p| rescale(p, letterbox)).collect())
}

/// NMS voraz: ordena por score y descarta las cajas con IoU > umbral.
pub fn non_max_suppression(mut candidates: Vec<Pose>, iou_threshold: f32) -> Vec<Pose> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![true; candidates.len()];
    for i in 0..candidates.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if keep[j] && compute_iou(&candidates[i], &candidates[j]) > iou_threshold {
                keep[j] = false;
            }
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(pose, keep)| keep.then_some(pose))
        .collect()
}

pub fn compute_iou(a: &Pose, b: &Pose) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

fn rescale(pose: Pose, lb: &Letterbox) -> Pose {
    let (x1, y1) = lb.to_original(pose.x1, pose.y1);
    let (x2, y2) = lb.to_original(pose.x2, pose.y2);
    let mut keypoints = pose.keypoints;
    for kp in keypoints.iter_mut() {
        let (x, y) = lb.to_original(kp.x, kp.y);
        kp.x = x;
        kp.y = y;
    }
    Pose {
        x1,
        y1,
        x2,
        y2,
        keypoints,
        ..pose
    }
}
