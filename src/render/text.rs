use std::path::Path;

use anyhow::Context;

use crate::{
    foundation::{
        core::{Point, RasterImage, Rgba8},
        error::{WatermarkError, WatermarkResult},
    },
    render::composite::over_in_place,
};

#[derive(Clone, Copy, Debug, PartialEq)]
/// One piece of text to measure or draw.
pub struct TextRun<'a> {
    /// Text content.
    pub text: &'a str,
    /// Straight-alpha fill color.
    pub color: Rgba8,
    /// Size in pixels.
    pub size_px: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
/// Pixel extent of a measured text run.
pub struct TextBounds {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent above the baseline.
    pub height: f32,
}

/// Text measurement and rasterization capability used by the engine.
pub trait TextRenderer {
    /// Measure `run` at its configured size.
    fn measure(&mut self, run: &TextRun<'_>) -> WatermarkResult<TextBounds>;

    /// Draw `run` onto `canvas` with its first baseline starting at `baseline`.
    fn draw(
        &mut self,
        canvas: &mut RasterImage,
        run: &TextRun<'_>,
        baseline: Point,
    ) -> WatermarkResult<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// [`TextRenderer`] that shapes with Parley and rasterizes glyphs with `vello_cpu`.
///
/// A single font face, supplied as raw bytes, is used for every run.
pub struct ParleyTextRenderer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for ParleyTextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParleyTextRenderer")
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl ParleyTextRenderer {
    /// Register `font_bytes` (TTF/OTF) and use its first family.
    pub fn from_font_bytes(font_bytes: Vec<u8>) -> WatermarkResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| WatermarkError::render("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| WatermarkError::render("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    /// Read a font file and register it.
    pub fn from_font_file(path: impl AsRef<Path>) -> WatermarkResult<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Self::from_font_bytes(bytes)
    }

    /// Family name of the registered font.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn layout(&mut self, run: &TextRun<'_>) -> WatermarkResult<parley::Layout<TextBrushRgba8>> {
        if !run.size_px.is_finite() || run.size_px <= 0.0 {
            return Err(WatermarkError::invalid_overlay(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, run.text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(run.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::from(
            run.color,
        )));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(run.text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

fn first_line_metrics(layout: &parley::Layout<TextBrushRgba8>) -> (f32, f32) {
    layout
        .lines()
        .next()
        .map(|line| {
            let m = line.metrics();
            (m.ascent, m.baseline)
        })
        .unwrap_or((0.0, 0.0))
}

impl TextRenderer for ParleyTextRenderer {
    fn measure(&mut self, run: &TextRun<'_>) -> WatermarkResult<TextBounds> {
        let layout = self.layout(run)?;
        let (ascent, _) = first_line_metrics(&layout);
        Ok(TextBounds {
            width: layout.width(),
            height: ascent,
        })
    }

    fn draw(
        &mut self,
        canvas: &mut RasterImage,
        run: &TextRun<'_>,
        baseline: Point,
    ) -> WatermarkResult<()> {
        let width: u16 = canvas
            .width()
            .try_into()
            .map_err(|_| WatermarkError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height()
            .try_into()
            .map_err(|_| WatermarkError::render("canvas height exceeds u16"))?;

        if width == 0 || height == 0 {
            return Ok(());
        }

        let layout = self.layout(run)?;
        let (_, first_baseline) = first_line_metrics(&layout);

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            baseline.x,
            baseline.y - f64::from(first_baseline),
        )));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };

                let brush = glyph_run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = glyph_run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(glyph_run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        over_in_place(canvas.data_mut(), pixmap.data_as_u8_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let err = ParleyTextRenderer::from_font_bytes(b"not a font".to_vec()).unwrap_err();
        assert!(matches!(err, WatermarkError::Render(_)));
    }

    #[test]
    fn missing_font_file_is_reported_with_path() {
        let err = ParleyTextRenderer::from_font_file("/nonexistent/font.ttf").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn brush_copies_channels() {
        let b = TextBrushRgba8::from(Rgba8::rgba(1, 2, 3, 4));
        assert_eq!(
            b,
            TextBrushRgba8 {
                r: 1,
                g: 2,
                b: 3,
                a: 4
            }
        );
    }
}
