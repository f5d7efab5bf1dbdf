//! Output-space geometry: where the frame and the webcam go.

use reframe_project_model::{Rect, Size, WebcamPosition, WebcamStyles};

/// Webcam edge padding as a fraction of the smaller output side.
pub const WEBCAM_EDGE_PADDING: f64 = 0.02;

/// Webcam corner radius as a fraction of its side.
pub const WEBCAM_CORNER_RADIUS: f64 = 0.35;

/// The frame content rectangle in output pixels.
///
/// The output is shrunk by `padding_percent` on every side and the video is
/// contain-fitted, centred, into what is left. An invalid `video` size fills
/// the padded box.
pub fn frame_rect(output: Size, padding_percent: f64, video: Size) -> Rect {
    let padding = padding_percent.clamp(0.0, 50.0) / 100.0;
    let available = Rect::new(
        output.width * padding,
        output.height * padding,
        output.width * (1.0 - 2.0 * padding),
        output.height * (1.0 - 2.0 * padding),
    );
    if !video.is_valid() || !available.size().is_valid() {
        return available;
    }

    let fit = contain(video, available.size());
    Rect::new(
        available.x + (available.width - fit.width) / 2.0,
        available.y + (available.height - fit.height) / 2.0,
        fit.width,
        fit.height,
    )
}

/// Largest size with `content`'s aspect ratio that fits inside `bounds`.
pub fn contain(content: Size, bounds: Size) -> Size {
    let scale = (bounds.width / content.width).min(bounds.height / content.height);
    Size::new(content.width * scale, content.height * scale)
}

/// The part of a `source` image that cover-fills a `dest` box: the largest
/// centred crop with the destination's aspect ratio.
pub fn cover_crop(source: Size, dest: Size) -> Rect {
    if !source.is_valid() || !dest.is_valid() {
        return Rect::new(0.0, 0.0, source.width, source.height);
    }
    let source_aspect = source.aspect_ratio();
    let dest_aspect = dest.aspect_ratio();
    if source_aspect > dest_aspect {
        let width = source.height * dest_aspect;
        Rect::new((source.width - width) / 2.0, 0.0, width, source.height)
    } else {
        let height = source.width / dest_aspect;
        Rect::new(0.0, (source.height - height) / 2.0, source.width, height)
    }
}

/// The webcam square in output pixels.
pub fn webcam_rect(output: Size, styles: &WebcamStyles) -> Rect {
    let min_side = output.min_side();
    let side = (styles.size.clamp(0.0, 100.0) / 100.0) * min_side;
    let pad = WEBCAM_EDGE_PADDING * min_side;
    let (x, y) = match styles.position {
        WebcamPosition::TopLeft => (pad, pad),
        WebcamPosition::TopRight => (output.width - pad - side, pad),
        WebcamPosition::BottomLeft => (pad, output.height - pad - side),
        WebcamPosition::BottomRight => {
            (output.width - pad - side, output.height - pad - side)
        }
    };
    Rect::new(x, y, side, side)
}
