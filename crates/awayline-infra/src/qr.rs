//! SVG QR renderer for pairing payloads.
//!
//! Turns the raw pairing code handed up by the protocol client into an SVG
//! QR image wrapped in a base64 data URL, ready for a dashboard to drop
//! straight into an image tag.

use awayline_core::protocol::PairingRenderer;
use awayline_types::error::GatewayError;
use base64::Engine;
use qrcode::QrCode;
use qrcode::render::svg;

/// Renders pairing codes as `data:image/svg+xml;base64,...` URLs.
pub struct SvgQrRenderer;

impl PairingRenderer for SvgQrRenderer {
    fn render(&self, code: &str) -> Result<String, GatewayError> {
        let qr = QrCode::new(code.as_bytes())
            .map_err(|e| GatewayError::Pairing(format!("qr encode failed: {e}")))?;
        let image = qr
            .render::<svg::Color>()
            .min_dimensions(256, 256)
            .build();
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        Ok(format!("data:image/svg+xml;base64,{encoded}"))
    }
}
