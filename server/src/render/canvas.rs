//! Rasterizes a [`CredentialLayout`] with tiny-skia. Text uses the 8x8
//! bitmap glyphs of `font8x8`, scaled to the requested size.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use tiny_skia::{
    Color, FillRule, FilterQuality, GradientStop, LinearGradient, Mask, Paint, PathBuilder, Pixmap,
    PixmapPaint, Point, Rect, Shader, SpreadMode, Stroke, Transform,
};

use super::layout::{Area, CredentialLayout, DrawOp, FontWeight};
use super::RenderError;
use crate::models::HexColor;

const GLYPH_CELLS: f32 = 8.0;
/// Row of the glyph cell that sits on the baseline.
const GLYPH_BASELINE_ROW: f32 = 7.0;

fn color(value: HexColor) -> Color {
    Color::from_rgba8(value.r, value.g, value.b, 255)
}

fn solid(value: HexColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(value));
    paint.anti_alias = false;
    paint
}

fn rect(area: Area) -> Option<Rect> {
    Rect::from_xywh(area.x, area.y, area.width, area.height)
}

/// Horizontal space taken by `text` at `size` pixels.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

pub fn rasterize(layout: &CredentialLayout, photo: Option<&Pixmap>) -> Result<Pixmap, RenderError> {
    let width = layout.dimensions.width;
    let height = layout.dimensions.height;
    let mut pixmap =
        Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions { width, height })?;

    for op in &layout.ops {
        match op {
            DrawOp::Fill { area, color } => fill(&mut pixmap, *area, *color),
            DrawOp::Stroke { area, width, color } => stroke(&mut pixmap, *area, *width, *color),
            DrawOp::Gradient { area, from, to } => gradient(&mut pixmap, *area, *from, *to),
            DrawOp::Text {
                text,
                center_x,
                baseline,
                size,
                weight,
                color,
            } => draw_text(
                &mut pixmap,
                text,
                *center_x,
                *baseline,
                *size,
                *weight,
                *color,
            ),
            DrawOp::Photo { area } => {
                if let Some(photo) = photo {
                    draw_photo(&mut pixmap, *area, photo);
                }
            }
        }
    }

    Ok(pixmap)
}

fn fill(pixmap: &mut Pixmap, area: Area, value: HexColor) {
    if let Some(rect) = rect(area) {
        pixmap.fill_rect(rect, &solid(value), Transform::identity(), None);
    }
}

fn stroke(pixmap: &mut Pixmap, area: Area, width: f32, value: HexColor) {
    if let Some(rect) = rect(area) {
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &solid(value), &stroke, Transform::identity(), None);
    }
}

fn gradient(pixmap: &mut Pixmap, area: Area, from: HexColor, to: HexColor) {
    let Some(rect) = rect(area) else {
        return;
    };
    let shader = LinearGradient::new(
        Point::from_xy(area.x, area.y),
        Point::from_xy(area.x + area.width, area.y),
        vec![
            GradientStop::new(0.0, color(from)),
            GradientStop::new(1.0, color(to)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or(Shader::SolidColor(color(from)));

    let mut paint = Paint::default();
    paint.shader = shader;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

fn draw_text(
    pixmap: &mut Pixmap,
    text: &str,
    center_x: f32,
    baseline: f32,
    size: f32,
    weight: FontWeight,
    value: HexColor,
) {
    let scale = size / GLYPH_CELLS;
    let left = center_x - text_width(text, size) / 2.0;
    let top = baseline - GLYPH_BASELINE_ROW * scale;
    let stem = match weight {
        FontWeight::Regular => scale,
        FontWeight::Bold => scale * 1.5,
    };

    let mut builder = PathBuilder::new();
    for (index, ch) in text.chars().enumerate() {
        let origin = left + index as f32 * size;
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..8u8 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let x = origin + f32::from(col) * scale;
                let y = top + row as f32 * scale;
                if let Some(cell) = Rect::from_xywh(x, y, stem, scale) {
                    builder.push_rect(cell);
                }
            }
        }
    }

    if let Some(path) = builder.finish() {
        pixmap.fill_path(
            &path,
            &solid(value),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

fn draw_photo(pixmap: &mut Pixmap, area: Area, photo: &Pixmap) {
    let radius = area.width.min(area.height) / 2.0;
    let Some(circle) =
        PathBuilder::from_circle(area.center_x(), area.y + area.height / 2.0, radius)
    else {
        return;
    };
    let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) else {
        return;
    };
    mask.fill_path(&circle, FillRule::Winding, true, Transform::identity());

    let scale_x = area.width / photo.width() as f32;
    let scale_y = area.height / photo.height() as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(
        0,
        0,
        photo.as_ref(),
        &paint,
        Transform::from_row(scale_x, 0.0, 0.0, scale_y, area.x, area.y),
        Some(&mask),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dimensions;
    use crate::render::layout::PHOTO_AREA;

    fn rgb(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
        let pixel = pixmap.pixel(x, y).unwrap();
        (pixel.red(), pixel.green(), pixel.blue())
    }

    fn layout(ops: Vec<DrawOp>) -> CredentialLayout {
        CredentialLayout {
            dimensions: Dimensions {
                width: 200,
                height: 200,
            },
            ops,
        }
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let layout = CredentialLayout {
            dimensions: Dimensions {
                width: 0,
                height: 250,
            },
            ops: Vec::new(),
        };
        assert!(matches!(
            rasterize(&layout, None),
            Err(RenderError::InvalidDimensions {
                width: 0,
                height: 250
            })
        ));
    }

    #[test]
    fn test_fill_and_text_pixels() {
        let pixmap = rasterize(
            &layout(vec![
                DrawOp::Fill {
                    area: Area {
                        x: 0.0,
                        y: 0.0,
                        width: 200.0,
                        height: 200.0,
                    },
                    color: HexColor::rgb(255, 255, 255),
                },
                DrawOp::Text {
                    text: "H".into(),
                    center_x: 100.0,
                    baseline: 100.0,
                    size: 16.0,
                    weight: FontWeight::Regular,
                    color: HexColor::rgb(0, 0, 0),
                },
            ]),
            None,
        )
        .unwrap();

        assert_eq!(rgb(&pixmap, 5, 5), (255, 255, 255));
        let glyph_box = (92..108).flat_map(|x| (86..102).map(move |y| (x, y)));
        assert!(glyph_box
            .into_iter()
            .any(|(x, y)| rgb(&pixmap, x, y) == (0, 0, 0)));
    }

    #[test]
    fn test_photo_is_clipped_to_a_circle() {
        let mut photo = Pixmap::new(10, 10).unwrap();
        photo.fill(Color::from_rgba8(255, 0, 0, 255));

        let pixmap = rasterize(&layout(vec![DrawOp::Photo { area: PHOTO_AREA }]), Some(&photo))
            .unwrap();

        let (r, _, _) = rgb(&pixmap, 80, 140);
        assert!(r > 200, "center of the photo circle should be red");
        assert_eq!(pixmap.pixel(41, 101).unwrap().alpha(), 0, "corner is clipped");
    }

    #[test]
    fn test_text_width_is_per_character() {
        assert_eq!(text_width("Photo", 12.0), 60.0);
        assert_eq!(text_width("", 12.0), 0.0);
    }
}
