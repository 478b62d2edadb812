//! Render lists for the drawing surface.
//!
//! The editor does not draw anything itself. A surface receives a
//! [`RenderList`] (visible elements in paint order, each tagged with its
//! element id) and reports finished interactions back through
//! [`EditorSession::update_element`].

use crate::element::{
    BarcodeType, ChartType, ElementId, ElementKind, ImageFit, TextAlign, VariantProperties,
};
use crate::geometry::{Bounds, Color, Position};
use crate::session::EditorSession;
use crate::TemplateResult;

const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };

/// What to draw for one element.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A run of text.
    Text {
        /// Text content.
        content: String,
        /// Font family.
        font_family: String,
        /// Font size.
        font_size: f64,
        /// CSS font weight.
        font_weight: String,
        /// Text color.
        color: Color,
        /// Alignment.
        align: TextAlign,
    },
    /// A bitmap.
    Image {
        /// Source URL.
        src: String,
        /// Fit mode.
        fit: ImageFit,
    },
    /// A filled and/or stroked rectangle.
    Rect {
        /// Fill color.
        fill: Option<Color>,
        /// Stroke color.
        stroke: Option<Color>,
        /// Stroke width.
        stroke_width: f64,
    },
    /// An ellipse inscribed in the bounds.
    Ellipse {
        /// Fill color.
        fill: Option<Color>,
        /// Stroke color.
        stroke: Option<Color>,
        /// Stroke width.
        stroke_width: f64,
    },
    /// A horizontal line across the bounds.
    Line {
        /// Stroke color.
        stroke: Color,
        /// Stroke width.
        stroke_width: f64,
    },
    /// A grid of cells.
    Table {
        /// Row count.
        rows: u32,
        /// Column count.
        columns: u32,
    },
    /// A QR code or barcode.
    Code {
        /// Symbology.
        symbology: BarcodeType,
        /// Encoded payload.
        data: String,
    },
    /// A chart.
    Chart {
        /// Chart style.
        chart_type: ChartType,
        /// Number of data series.
        series: usize,
    },
    /// A button.
    Button {
        /// Label.
        text: String,
        /// Background color.
        background: Color,
        /// Label color.
        text_color: Color,
    },
}

/// One element ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    /// Element this item draws; interactions map back through it.
    pub id: ElementId,
    /// Element kind.
    pub kind: ElementKind,
    /// Unrotated page-space box.
    pub bounds: Bounds,
    /// Rotation in degrees around the box origin.
    pub rotation: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Whether the element accepts interactive edits.
    pub locked: bool,
    /// Whether the element is selected.
    pub selected: bool,
    /// What to draw.
    pub primitive: Primitive,
}

/// A frame's worth of drawing instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderList {
    /// Visible elements, back to front.
    pub items: Vec<RenderItem>,
    /// Zoom factor.
    pub zoom: f64,
    /// Pan offset.
    pub offset: Position,
    /// Draw the grid.
    pub show_grid: bool,
    /// Grid spacing.
    pub grid_size: f64,
}

impl RenderList {
    /// Topmost item under a page point that accepts interaction.
    #[must_use]
    pub fn hit_test(&self, point: Position) -> Option<&ElementId> {
        self.items
            .iter()
            .rev()
            .find(|item| {
                !item.locked
                    && point.x >= item.bounds.min_x
                    && point.x <= item.bounds.max_x
                    && point.y >= item.bounds.min_y
                    && point.y <= item.bounds.max_y
            })
            .map(|item| &item.id)
    }
}

/// A drawing surface mirroring the document.
pub trait RenderSurface {
    /// Draw a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface fails to draw.
    fn render(&mut self, list: &RenderList) -> TemplateResult<()>;
}

fn color_or(value: &str, fallback: Color) -> Color {
    Color::from_hex(value).unwrap_or(fallback)
}

fn optional_color(value: Option<&String>) -> Option<Color> {
    value.and_then(|v| Color::from_hex(v))
}

fn primitive(kind: ElementKind, variant: &VariantProperties) -> Primitive {
    match variant {
        VariantProperties::Text(text) => Primitive::Text {
            content: text.content.clone(),
            font_family: text.font_family.clone(),
            font_size: text.font_size,
            font_weight: text.font_weight.clone(),
            color: color_or(&text.color, BLACK),
            align: text.text_align,
        },
        VariantProperties::Image(image) => Primitive::Image {
            src: image.src.clone(),
            fit: image.fit,
        },
        VariantProperties::Container(container) => Primitive::Rect {
            fill: optional_color(container.background_color.as_ref()),
            stroke: container
                .border
                .as_ref()
                .and_then(|b| Color::from_hex(&b.color)),
            stroke_width: container.border.as_ref().map_or(0.0, |b| b.width),
        },
        VariantProperties::Table(table) => Primitive::Table {
            rows: table.rows,
            columns: table.columns,
        },
        VariantProperties::Shape(shape) => {
            let fill = optional_color(shape.fill_color.as_ref());
            let stroke = optional_color(shape.stroke_color.as_ref());
            match kind {
                ElementKind::Circle => Primitive::Ellipse {
                    fill,
                    stroke,
                    stroke_width: shape.stroke_width,
                },
                ElementKind::Line => Primitive::Line {
                    stroke: stroke.unwrap_or(BLACK),
                    stroke_width: shape.stroke_width,
                },
                _ => Primitive::Rect {
                    fill,
                    stroke,
                    stroke_width: shape.stroke_width,
                },
            }
        }
        VariantProperties::Barcode(code) => Primitive::Code {
            symbology: code.barcode_type,
            data: code.data.clone(),
        },
        VariantProperties::Chart(chart) => Primitive::Chart {
            chart_type: chart.chart_type,
            series: chart.data.datasets.len(),
        },
        VariantProperties::Button(button) => Primitive::Button {
            text: button.text.clone(),
            background: color_or(&button.background_color, BLACK),
            text_color: color_or(&button.text_color, Color { r: 255, g: 255, b: 255, a: 255 }),
        },
    }
}

impl EditorSession {
    /// Build the render list for the current state.
    ///
    /// Hidden elements are skipped. Items are sorted by z-index; ties keep
    /// document order.
    #[must_use]
    pub fn render_list(&self) -> RenderList {
        let mut layered: Vec<(i32, RenderItem)> = self
            .elements()
            .iter()
            .filter(|e| e.base().visible)
            .map(|e| {
                let props = e.properties();
                let item = RenderItem {
                    id: e.id().clone(),
                    kind: e.kind(),
                    bounds: props.bounds(),
                    rotation: props.base.transform.map_or(0.0, |t| t.rotation),
                    opacity: props.base.opacity,
                    locked: props.base.locked,
                    selected: self.is_selected(e.id()),
                    primitive: primitive(e.kind(), props.variant()),
                };
                (props.base.z_index, item)
            })
            .collect();
        // Stable sort keeps document order among equal z-indices.
        layered.sort_by_key(|(z_index, _)| *z_index);
        let items: Vec<RenderItem> = layered.into_iter().map(|(_, item)| item).collect();

        tracing::trace!("Render list: {} items", items.len());
        let view = self.view();
        RenderList {
            items,
            zoom: view.zoom(),
            offset: view.offset,
            show_grid: view.show_grid,
            grid_size: view.grid_size(),
        }
    }

    /// Build the render list and hand it to a surface.
    ///
    /// # Errors
    ///
    /// Propagates the surface's error.
    pub fn render_to(&self, surface: &mut dyn RenderSurface) -> TemplateResult<()> {
        surface.render(&self.render_list())
    }
}
