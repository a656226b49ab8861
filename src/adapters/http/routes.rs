use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, warn};

use crate::adapters::http::state::HttpState;
use crate::application::dto::{ErrorResponse, OkResponse, PredictForm};
use crate::domain::{
    errors::{DomainError, DomainResult, ExecutionContext, PredictionError},
    frame::encode_png,
    interface::InterfaceSpec,
    request::PredictionRequest,
};

impl IntoResponse for PredictionError {
    fn into_response(self) -> Response {
        let status = match &self.source {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

fn png_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}

pub async fn health() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

pub async fn get_interface(State(st): State<HttpState>) -> Json<InterfaceSpec> {
    Json(st.interface.as_ref().clone())
}

pub async fn predict(State(st): State<HttpState>, mut multipart: Multipart) -> Response {
    let ctx = ExecutionContext::new("predict_pose");
    let request = match read_form(&mut multipart).await.and_then(PredictionRequest::try_from) {
        Ok(r) => r,
        Err(e) => return ctx.fail(e).into_response(),
    };

    let model = request.model;
    match st.prediction.predict(request).await {
        Ok(annotated) => match encode_png(&annotated) {
            Ok(bytes) => {
                debug!("Respuesta {} ({} bytes)", model, bytes.len());
                png_response(bytes)
            }
            Err(e) => ctx.with_model(model.name()).fail(e).into_response(),
        },
        Err(e) => e.into_response(),
    }
}

pub async fn example_output(State(st): State<HttpState>, Path(index): Path<usize>) -> Response {
    match st.examples.output(index).await {
        Ok(png) => png_response(png.as_ref().clone()),
        Err(e) => e.into_response(),
    }
}

async fn read_form(multipart: &mut Multipart) -> DomainResult<PredictForm> {
    let mut form = PredictForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::InvalidInput(format!("multipart: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == "image" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| DomainError::InvalidInput(format!("image: {e}")))?;
            form.image = Some(bytes.to_vec());
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| DomainError::InvalidInput(format!("{name}: {e}")))?;
        match name.as_str() {
            "conf_threshold" => form.conf_threshold = Some(text),
            "iou_threshold" => form.iou_threshold = Some(text),
            "max_detections" => form.max_detections = Some(text),
            "model_name" => form.model_name = Some(text),
            other => debug!("Campo de formulario ignorado: {}", other),
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::router;
    use crate::application::services::tests::{service_with, test_image, FakeCatalog};
    use crate::application::services::ExampleService;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "----pose-test-boundary";

    fn state() -> HttpState {
        let (svc, _) = service_with(FakeCatalog::scripted());
        let prediction = Arc::new(svc);
        let interface = Arc::new(InterfaceSpec::pose_demo());
        let examples = Arc::new(ExampleService::new(
            interface.examples.clone(),
            std::env::temp_dir().join("no-existe-pose-demo"),
            prediction.clone(),
        ));
        HttpState {
            interface,
            prediction,
            examples,
        }
    }

    fn multipart_body(image: Option<&[u8]>, fields: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(bytes) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"in.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        for (name, value) in fields {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                    .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn predict_request(body: Vec<u8>) -> Request<Body> {
        Request::post("/api/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_bytes(res: Response) -> Vec<u8> {
        res.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn serves_interface_and_health() {
        let app = router(state(), 1 << 20);
        let res = app
            .clone()
            .oneshot(Request::get("/api/interface").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(res).await).unwrap();
        assert_eq!(json["title"], "YOLO11 Pose Estimation");
        assert_eq!(json["inputs"].as_array().unwrap().len(), 5);

        let res = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn predict_returns_png_with_input_dimensions() {
        let input = encode_png(&test_image().to_rgb8()).unwrap();
        let body = multipart_body(
            Some(&input),
            &[
                ("conf_threshold", "0.25"),
                ("iou_threshold", "0.45"),
                ("max_detections", "300"),
                ("model_name", "yolo11m-pose.pt"),
            ],
        );
        let res = router(state(), 1 << 20).oneshot(predict_request(body)).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
        let out = image::load_from_memory(&body_bytes(res).await).unwrap();
        assert_eq!((out.width(), out.height()), (100, 80));
    }

    #[tokio::test]
    async fn predict_without_image_is_a_wrapped_client_error() {
        let body = multipart_body(None, &[("conf_threshold", "0.25")]);
        let res = router(state(), 1 << 20).oneshot(predict_request(body)).await.unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body_bytes(res).await).unwrap();
        assert_eq!(err.error, DomainError::MissingImage.to_string());
        assert!(err.context.starts_with("predict_pose"));
    }

    #[tokio::test]
    async fn corrupt_image_is_a_wrapped_client_error() {
        let body = multipart_body(Some(&b"\x89PNG\r\n\x1a\nbasura"[..]), &[("model_name", "yolo11n-pose.pt")]);
        let res = router(state(), 1 << 20).oneshot(predict_request(body)).await.unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body_bytes(res).await).unwrap();
        assert!(err.error.starts_with("Imagen no soportada"), "{}", err.error);
        assert!(err.context.starts_with("predict_pose"));
        assert!(!err.request_id.is_empty());
    }

    #[tokio::test]
    async fn predict_rejects_unknown_model() {
        let input = encode_png(&test_image().to_rgb8()).unwrap();
        let body = multipart_body(Some(&input), &[("model_name", "yolov5.pt")]);
        let res = router(state(), 1 << 20).oneshot(predict_request(body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_example_is_not_found() {
        let app = router(state(), 1 << 20);
        for path in ["/api/examples/0", "/api/examples/42"] {
            let res = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn oversized_uploads_are_rejected() {
        let input = vec![0u8; 4096];
        let body = multipart_body(Some(&input), &[]);
        let res = router(state(), 1024).oneshot(predict_request(body)).await.unwrap();
        assert!(res.status().is_client_error());
    }
}
