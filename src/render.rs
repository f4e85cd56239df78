use image::{DynamicImage, ImageFormat, Rgba as Pixel, RgbaImage};
use std::io::Cursor;

use crate::error::Result;
use crate::geometry::Rect;
use crate::scene::Scene;

const SELECTION_COLOR: [u8; 4] = [0, 255, 0, 255];
const SELECTION_WIDTH: i32 = 2;

/// What to composite on top of the background and rectangles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    /// Live canvas: includes the draw preview and the selection outline.
    Interactive,
    /// Saved image: background and committed rectangles only.
    Export,
}

/// Redraws the whole canvas from the scene. Output depends on nothing but
/// the scene and the layer.
pub fn render(scene: &Scene, layer: Layer) -> RgbaImage {
    let (w, h) = scene.size();
    let mut img = RgbaImage::new(w, h);

    if let Some(bg) = &scene.background {
        image::imageops::replace(&mut img, bg, 0, 0);
    }

    for (i, rect) in scene.rects.iter().enumerate() {
        fill_rect(&mut img, rect);
        if layer == Layer::Interactive && scene.selected == Some(i) {
            stroke_rect(&mut img, rect);
        }
    }

    if layer == Layer::Interactive {
        if let Some(draft) = &scene.draft {
            fill_rect(&mut img, &draft.normalized());
        }
    }

    img
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img.clone()).write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Replaces each pixel's colour with the mean of its channels. Alpha is kept.
pub fn greyscale(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        let [r, g, b, a] = px.0;
        let avg = ((r as f32 + g as f32 + b as f32) / 3.0).round() as u8;
        *px = Pixel([avg, avg, avg, a]);
    }
    out
}

fn fill_rect(img: &mut RgbaImage, rect: &Rect) {
    let color = rect.color.to_rgba8();
    if color[3] == 0 {
        return;
    }
    fill_span(img, rect.x, rect.y, rect.right(), rect.bottom(), |dst| {
        blend(dst, color)
    });
}

/// A stroke of `SELECTION_WIDTH` centred on the rectangle's edges.
fn stroke_rect(img: &mut RgbaImage, rect: &Rect) {
    let half = SELECTION_WIDTH / 2;
    let (x0, y0) = (rect.x.saturating_sub(half), rect.y.saturating_sub(half));
    let (x1, y1) = (rect.right().saturating_add(half), rect.bottom().saturating_add(half));
    let mut paint = |x0, y0, x1, y1| {
        fill_span(img, x0, y0, x1, y1, |dst| *dst = Pixel(SELECTION_COLOR));
    };
    paint(x0, y0, x1, y0.saturating_add(SELECTION_WIDTH));
    paint(x0, y1.saturating_sub(SELECTION_WIDTH), x1, y1);
    paint(x0, y0, x0.saturating_add(SELECTION_WIDTH), y1);
    paint(x1.saturating_sub(SELECTION_WIDTH), y0, x1, y1);
}

/// Applies `f` to every pixel in `[x0, x1) × [y0, y1)` that lies on the image.
fn fill_span(
    img: &mut RgbaImage,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    mut f: impl FnMut(&mut Pixel<u8>),
) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let (x0, x1) = (x0.clamp(0, w), x1.clamp(0, w));
    let (y0, y1) = (y0.clamp(0, h), y1.clamp(0, h));
    for py in y0..y1 {
        for px in x0..x1 {
            f(img.get_pixel_mut(px as u32, py as u32));
        }
    }
}

/// Source-over compositing with straight (non-premultiplied) alpha.
fn blend(dst: &mut Pixel<u8>, src: [u8; 4]) {
    let sa = src[3] as f32 / 255.0;
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Pixel([0, 0, 0, 0]);
        return;
    }
    let mix = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round() as u8
    };
    *dst = Pixel([
        mix(src[0], dst.0[0]),
        mix(src[1], dst.0[1]),
        mix(src[2], dst.0[2]),
        (out_a * 255.0).round() as u8,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::geometry::Point;
    use crate::scene::Draft;

    fn scene_with_background() -> Scene {
        let mut scene = Scene::new((10, 10));
        scene.background = Some(RgbaImage::from_pixel(40, 30, Pixel([200, 200, 200, 255])));
        scene
    }

    #[test]
    fn canvas_takes_background_size() {
        let img = render(&scene_with_background(), Layer::Export);
        assert_eq!(img.dimensions(), (40, 30));
        assert_eq!(img.get_pixel(0, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn rectangles_fill_in_order() {
        let mut scene = Scene::new((20, 20));
        scene.push(Rect::new(0, 0, 10, 10, Rgba::opaque(255, 0, 0)));
        scene.push(Rect::new(5, 5, 10, 10, Rgba::opaque(0, 0, 255)));
        let img = render(&scene, Layer::Export);
        assert_eq!(img.get_pixel(2, 2).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(7, 7).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(15, 15).0, [0, 0, 0, 0]);
    }

    #[test]
    fn translucent_fill_blends_with_background() {
        let mut scene = Scene::new((4, 4));
        scene.background = Some(RgbaImage::from_pixel(4, 4, Pixel([0, 0, 0, 255])));
        scene.push(Rect::new(0, 0, 4, 4, Rgba::new(255, 255, 255, 0.5)));
        let img = render(&scene, Layer::Export);
        assert_eq!(img.get_pixel(1, 1).0, [128, 128, 128, 255]);
    }

    #[test]
    fn selection_outline_only_when_interactive() {
        let mut scene = Scene::new((40, 40));
        scene.push(Rect::new(10, 10, 20, 20, Rgba::opaque(255, 0, 0)));
        scene.selected = Some(0);

        let live = render(&scene, Layer::Interactive);
        assert_eq!(live.get_pixel(10, 20).0, SELECTION_COLOR);
        assert_eq!(live.get_pixel(9, 20).0, SELECTION_COLOR);
        assert_eq!(live.get_pixel(20, 20).0, [255, 0, 0, 255]);

        let export = render(&scene, Layer::Export);
        assert_eq!(export.get_pixel(10, 20).0, [255, 0, 0, 255]);
        assert_eq!(export.get_pixel(9, 20).0, [0, 0, 0, 0]);
    }

    #[test]
    fn draft_previews_only_when_interactive() {
        let mut scene = Scene::new((30, 30));
        let mut draft = Draft::new(Point::new(20, 20), Rgba::opaque(0, 255, 255));
        draft.current = Point::new(5, 5);
        scene.draft = Some(draft);

        assert_eq!(render(&scene, Layer::Interactive).get_pixel(10, 10).0, [0, 255, 255, 255]);
        assert_eq!(render(&scene, Layer::Export).get_pixel(10, 10).0, [0, 0, 0, 0]);
    }

    #[test]
    fn greyscale_averages_and_keeps_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Pixel([30, 60, 91, 77]));
        let grey = greyscale(&img);
        assert_eq!(grey.get_pixel(1, 1).0, [60, 60, 60, 77]);
    }

    #[test]
    fn png_encoding_decodes_back() {
        let img = render(&scene_with_background(), Layer::Export);
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }
}
