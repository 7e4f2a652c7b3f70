use crate::encode::assemble::ExportResult;
use crate::foundation::error::{TurntableError, TurntableResult};

/// Encode as an animated PNG: RGBA8, exact alpha, loops forever.
pub fn encode_apng(result: &ExportResult) -> TurntableResult<Vec<u8>> {
    let geometry = result.geometry();
    let frame_count = u32::try_from(result.len())
        .map_err(|_| TurntableError::encode("too many frames for APNG"))?;

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, geometry.width, geometry.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_animated(frame_count, 0).map_err(png_err)?;

        let mut writer = encoder.write_header().map_err(png_err)?;
        for (frame, &delay_ms) in result.frames().iter().zip(result.delays_ms()) {
            let delay: u16 = delay_ms.try_into().map_err(|_| {
                TurntableError::encode(format!("frame delay {delay_ms}ms exceeds APNG range"))
            })?;
            writer.set_frame_delay(delay, 1000).map_err(png_err)?;
            writer
                .set_dispose_op(png::DisposeOp::Background)
                .map_err(png_err)?;
            writer.set_blend_op(png::BlendOp::Source).map_err(png_err)?;
            writer.write_image_data(&frame.data).map_err(png_err)?;
        }
        writer.finish().map_err(png_err)?;
    }
    Ok(out)
}

fn png_err(e: png::EncodingError) -> TurntableError {
    TurntableError::encode(format!("apng: {e}"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/apng.rs"]
mod tests;
