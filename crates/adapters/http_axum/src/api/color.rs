//! Color preview endpoint.

use axum::Json;
use serde::Deserialize;

use lumen_domain::color::{self, ColorPreview, ColorSpec};

/// Body of `POST /api/color/preview`.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub color: Option<ColorSpec>,
    /// Defaults to full brightness.
    #[serde(default, alias = "bri")]
    pub brightness: Option<u8>,
}

/// `POST /api/color/preview`: approximate sRGB hex for a color.
///
/// Colors without a chromaticity (an unparseable hex, no color at all)
/// preview as black.
pub async fn preview(Json(req): Json<PreviewRequest>) -> Json<ColorPreview> {
    Json(color::preview(req.color.as_ref(), req.brightness))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn should_preview_xy_color() {
        let app = TestApp::new();

        let (status, body) = app
            .post(
                "/api/color/preview",
                Some(json!({"color": {"xy": [0.3127, 0.3291]}, "brightness": 254})),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["xy"], json!([0.3127, 0.3291]));
        let hex = body["hex"].as_str().unwrap();
        assert_eq!(hex.len(), 7);
        assert!(hex.starts_with('#'));
    }

    #[tokio::test]
    async fn should_preview_missing_color_as_black() {
        let app = TestApp::new();

        let (status, body) = app.post("/api/color/preview", Some(json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"xy": null, "hex": "#000000"}));
    }
}
