//! Template elements - the positioned building blocks of a document.
//!
//! Every element has a kind (`text`, `rectangle`, `qr_code`, ...) and a typed
//! property set. Kinds are grouped into property families; an element's
//! variant properties always belong to its kind's family.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::geometry::{Border, BorderStyle, Bounds, Position, Size, Spacing, Transform};
use crate::{TemplateError, TemplateResult};

/// Property keys owned by the element identity, never overridable.
const PROTECTED_KEYS: [&str; 3] = ["id", "type", "family"];

/// Unique identifier for an element.
///
/// Freshly created elements get a UUID; imported elements keep whatever
/// identifier the source document used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The closed set of element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Plain text.
    Text,
    /// Large heading text.
    Title,
    /// Secondary heading text.
    Subtitle,
    /// Multi-line body text.
    Paragraph,
    /// Raster or vector image.
    Image,
    /// Brand logo image.
    Logo,
    /// Small icon image.
    Icon,
    /// Generic layout box.
    Container,
    /// Page section.
    Section,
    /// Decorated box.
    Box,
    /// Multi-column layout.
    Columns,
    /// Grid of cells.
    Table,
    /// Rectangle shape.
    Rectangle,
    /// Circle shape.
    Circle,
    /// Straight line shape.
    Line,
    /// QR code.
    QrCode,
    /// Linear barcode.
    Barcode,
    /// Data chart.
    Chart,
    /// Call-to-action button.
    Button,
}

impl ElementKind {
    /// Every kind, in toolbox order.
    pub const ALL: [Self; 19] = [
        Self::Text,
        Self::Title,
        Self::Subtitle,
        Self::Paragraph,
        Self::Image,
        Self::Logo,
        Self::Icon,
        Self::Container,
        Self::Section,
        Self::Box,
        Self::Columns,
        Self::Table,
        Self::Rectangle,
        Self::Circle,
        Self::Line,
        Self::QrCode,
        Self::Barcode,
        Self::Chart,
        Self::Button,
    ];

    /// The property family this kind's variant properties belong to.
    #[must_use]
    pub const fn family(self) -> PropertyFamily {
        match self {
            Self::Text | Self::Title | Self::Subtitle | Self::Paragraph => PropertyFamily::Text,
            Self::Image | Self::Logo | Self::Icon => PropertyFamily::Image,
            Self::Container | Self::Section | Self::Box | Self::Columns => {
                PropertyFamily::Container
            }
            Self::Table => PropertyFamily::Table,
            Self::Rectangle | Self::Circle | Self::Line => PropertyFamily::Shape,
            Self::QrCode | Self::Barcode => PropertyFamily::Barcode,
            Self::Chart => PropertyFamily::Chart,
            Self::Button => PropertyFamily::Button,
        }
    }

    /// Wire tag, as used in the `type` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Paragraph => "paragraph",
            Self::Image => "image",
            Self::Logo => "logo",
            Self::Icon => "icon",
            Self::Container => "container",
            Self::Section => "section",
            Self::Box => "box",
            Self::Columns => "columns",
            Self::Table => "table",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Line => "line",
            Self::QrCode => "qr_code",
            Self::Barcode => "barcode",
            Self::Chart => "chart",
            Self::Button => "button",
        }
    }

    /// Human-readable default name for new elements.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Title => "Title",
            Self::Subtitle => "Subtitle",
            Self::Paragraph => "Paragraph",
            Self::Image => "Image",
            Self::Logo => "Logo",
            Self::Icon => "Icon",
            Self::Container => "Container",
            Self::Section => "Section",
            Self::Box => "Box",
            Self::Columns => "Columns",
            Self::Table => "Table",
            Self::Rectangle => "Rectangle",
            Self::Circle => "Circle",
            Self::Line => "Line",
            Self::QrCode => "QR Code",
            Self::Barcode => "Barcode",
            Self::Chart => "Chart",
            Self::Button => "Button",
        }
    }

    /// Default variant properties for a freshly created element of this kind.
    #[must_use]
    pub fn default_variant(self) -> VariantProperties {
        match self {
            Self::Text => VariantProperties::Text(TextProperties::default()),
            Self::Title => VariantProperties::Text(TextProperties {
                content: "Title".to_string(),
                font_size: 32.0,
                font_weight: "bold".to_string(),
                color: "#1976d2".to_string(),
                ..TextProperties::default()
            }),
            Self::Subtitle => VariantProperties::Text(TextProperties {
                content: "Subtitle".to_string(),
                font_size: 24.0,
                font_weight: "600".to_string(),
                color: "#424242".to_string(),
                ..TextProperties::default()
            }),
            Self::Paragraph => VariantProperties::Text(TextProperties {
                content: "Lorem ipsum dolor sit amet...".to_string(),
                font_size: 14.0,
                line_height: 1.6,
                ..TextProperties::default()
            }),
            Self::Image | Self::Logo | Self::Icon => {
                VariantProperties::Image(ImageProperties::default())
            }
            Self::Container | Self::Section | Self::Box => {
                VariantProperties::Container(ContainerProperties::default())
            }
            Self::Columns => VariantProperties::Container(ContainerProperties {
                column_count: Some(2),
                gap: Some(16.0),
                ..ContainerProperties::default()
            }),
            Self::Table => VariantProperties::Table(TableProperties::with_grid(3, 3)),
            Self::Rectangle => VariantProperties::Shape(ShapeProperties::default()),
            Self::Circle => VariantProperties::Shape(ShapeProperties {
                fill_color: Some("#dc004e".to_string()),
                stroke_color: Some("#9a0036".to_string()),
                ..ShapeProperties::default()
            }),
            Self::Line => VariantProperties::Shape(ShapeProperties {
                fill_color: None,
                stroke_color: Some("#000000".to_string()),
                stroke_width: 2.0,
                ..ShapeProperties::default()
            }),
            Self::QrCode => VariantProperties::Barcode(BarcodeProperties::default()),
            Self::Barcode => VariantProperties::Barcode(BarcodeProperties {
                barcode_type: BarcodeType::Code128,
                data: "123456789".to_string(),
                ..BarcodeProperties::default()
            }),
            Self::Chart => VariantProperties::Chart(ChartProperties::default()),
            Self::Button => VariantProperties::Button(ButtonProperties::default()),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TemplateError::UnknownKind(s.to_string()))
    }
}

/// Groups of kinds sharing the same variant property shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyFamily {
    /// Text-bearing kinds.
    Text,
    /// Image kinds.
    Image,
    /// Layout boxes.
    Container,
    /// Tables.
    Table,
    /// Geometric shapes.
    Shape,
    /// QR codes and barcodes.
    Barcode,
    /// Charts.
    Chart,
    /// Buttons.
    Button,
}

impl fmt::Display for PropertyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Container => "container",
            Self::Table => "table",
            Self::Shape => "shape",
            Self::Barcode => "barcode",
            Self::Chart => "chart",
            Self::Button => "button",
        };
        f.write_str(name)
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
    /// Justified.
    Justify,
}

/// Font slant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
    /// Oblique.
    Oblique,
}

/// How an image fills its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFit {
    /// Stretch to the box.
    Fill,
    /// Letterbox inside the box.
    #[default]
    Contain,
    /// Crop to cover the box.
    Cover,
    /// Natural size.
    None,
    /// Natural size, shrunk to fit.
    ScaleDown,
}

/// Barcode symbology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeType {
    /// QR matrix code.
    #[default]
    #[serde(rename = "QR")]
    Qr,
    /// EAN-8.
    #[serde(rename = "EAN8")]
    Ean8,
    /// EAN-13.
    #[serde(rename = "EAN13")]
    Ean13,
    /// GS1-128.
    #[serde(rename = "EAN128")]
    Ean128,
    /// Code 39.
    Code39,
    /// Code 128.
    Code128,
}

/// Chart style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartType {
    /// Vertical bars.
    #[default]
    Bar,
    /// Polyline.
    Line,
    /// Pie slices.
    Pie,
    /// Filled area.
    Area,
}

/// Text content and typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProperties {
    /// Text content, may contain `{{variable}}` placeholders.
    pub content: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in points.
    pub font_size: f64,
    /// CSS font weight (`normal`, `bold`, `600`, ...).
    pub font_weight: String,
    /// Font slant.
    pub font_style: FontStyle,
    /// CSS color string.
    pub color: String,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// Line height multiplier.
    pub line_height: f64,
    /// Extra spacing between letters.
    pub letter_spacing: f64,
}

impl Default for TextProperties {
    fn default() -> Self {
        Self {
            content: "Text".to_string(),
            font_family: "Arial".to_string(),
            font_size: 16.0,
            font_weight: "normal".to_string(),
            font_style: FontStyle::Normal,
            color: "#000000".to_string(),
            text_align: TextAlign::Left,
            line_height: 1.2,
            letter_spacing: 0.0,
        }
    }
}

/// Image source and fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProperties {
    /// Source URL.
    pub src: String,
    /// Alternative text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Fit mode.
    pub fit: ImageFit,
}

impl Default for ImageProperties {
    fn default() -> Self {
        Self {
            src: "https://via.placeholder.com/300x200".to_string(),
            alt: None,
            fit: ImageFit::Contain,
        }
    }
}

/// Layout box styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerProperties {
    /// CSS background color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Inner spacing.
    pub padding: Spacing,
    /// Border.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    /// Number of columns (columns kind only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_count: Option<u32>,
    /// Gap between columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
}

impl Default for ContainerProperties {
    fn default() -> Self {
        Self {
            background_color: Some("#f5f5f5".to_string()),
            padding: Spacing::uniform(20.0),
            border: None,
            column_count: None,
            gap: None,
        }
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    /// Cell identifier, unique within its table.
    pub id: String,
    /// Cell text.
    #[serde(default)]
    pub content: String,
    /// Column span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colspan: Option<u32>,
    /// Row span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,
    /// CSS background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// A rows by columns grid of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableProperties {
    /// Row count.
    pub rows: u32,
    /// Column count.
    pub columns: u32,
    /// Cells, row-major.
    pub cells: Vec<Vec<TableCell>>,
    /// Collapse adjacent borders.
    pub border_collapse: bool,
    /// Spacing between cells.
    pub cell_spacing: f64,
    /// Padding inside cells.
    pub cell_padding: f64,
    /// Style the first row as a header.
    pub header_row: bool,
}

impl TableProperties {
    /// An empty grid with generated cell identifiers.
    #[must_use]
    pub fn with_grid(rows: u32, columns: u32) -> Self {
        let cells = (0..rows)
            .map(|r| {
                (0..columns)
                    .map(|c| TableCell {
                        id: format!("cell-{r}-{c}"),
                        content: String::new(),
                        colspan: None,
                        rowspan: None,
                        background_color: None,
                    })
                    .collect()
            })
            .collect();
        Self {
            rows,
            columns,
            cells,
            ..Self::default()
        }
    }

    /// Cell at `row`, `column`, if present.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&TableCell> {
        self.cells.get(row).and_then(|r| r.get(column))
    }
}

impl Default for TableProperties {
    fn default() -> Self {
        Self {
            rows: 0,
            columns: 0,
            cells: Vec::new(),
            border_collapse: true,
            cell_spacing: 0.0,
            cell_padding: 8.0,
            header_row: false,
        }
    }
}

/// Fill and stroke of a geometric shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeProperties {
    /// CSS fill color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    /// CSS stroke color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    /// Stroke width.
    pub stroke_width: f64,
    /// Stroke style.
    pub stroke_style: BorderStyle,
}

impl Default for ShapeProperties {
    fn default() -> Self {
        Self {
            fill_color: Some("#1976d2".to_string()),
            stroke_color: Some("#0d47a1".to_string()),
            stroke_width: 0.0,
            stroke_style: BorderStyle::Solid,
        }
    }
}

/// Encoded data and symbology of a code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarcodeProperties {
    /// Symbology.
    pub barcode_type: BarcodeType,
    /// Encoded payload.
    pub data: String,
    /// Variable whose value replaces `data` at render time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<String>,
    /// CSS bar color.
    pub foreground_color: String,
    /// CSS background color.
    pub background_color: String,
}

impl Default for BarcodeProperties {
    fn default() -> Self {
        Self {
            barcode_type: BarcodeType::Qr,
            data: "https://example.com".to_string(),
            variable_id: None,
            foreground_color: "#000000".to_string(),
            background_color: "#ffffff".to_string(),
        }
    }
}

/// One data series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    /// Series label.
    pub label: String,
    /// Values, one per chart label.
    pub data: Vec<f64>,
    /// CSS series color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// Labels and series of a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Category labels.
    pub labels: Vec<String>,
    /// Data series.
    pub datasets: Vec<ChartDataset>,
}

/// Chart configuration and dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartProperties {
    /// Chart style.
    pub chart_type: ChartType,
    /// Title above the chart.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Dataset.
    pub data: ChartData,
    /// Show the legend.
    pub show_legend: bool,
    /// Show grid lines.
    pub show_grid: bool,
}

impl Default for ChartProperties {
    fn default() -> Self {
        Self {
            chart_type: ChartType::Bar,
            title: None,
            data: ChartData {
                labels: vec!["Q1".to_string(), "Q2".to_string(), "Q3".to_string()],
                datasets: vec![ChartDataset {
                    label: "Series 1".to_string(),
                    data: vec![10.0, 20.0, 15.0],
                    background_color: None,
                }],
            },
            show_legend: true,
            show_grid: true,
        }
    }
}

/// Button label and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonProperties {
    /// Label text.
    pub text: String,
    /// Link target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// CSS background color.
    pub background_color: String,
    /// CSS label color.
    pub text_color: String,
    /// Label font size.
    pub font_size: f64,
    /// CSS font weight.
    pub font_weight: String,
    /// Inner spacing.
    pub padding: Spacing,
    /// Corner radius.
    pub border_radius: f64,
}

impl Default for ButtonProperties {
    fn default() -> Self {
        Self {
            text: "Click here".to_string(),
            href: None,
            background_color: "#1976d2".to_string(),
            text_color: "#ffffff".to_string(),
            font_size: 16.0,
            font_weight: "bold".to_string(),
            padding: Spacing {
                top: 12.0,
                right: 24.0,
                bottom: 12.0,
                left: 24.0,
            },
            border_radius: 4.0,
        }
    }
}

/// Kind-specific properties, one variant per family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum VariantProperties {
    /// Text family.
    Text(TextProperties),
    /// Image family.
    Image(ImageProperties),
    /// Container family.
    Container(ContainerProperties),
    /// Table family.
    Table(TableProperties),
    /// Shape family.
    Shape(ShapeProperties),
    /// Barcode family.
    Barcode(BarcodeProperties),
    /// Chart family.
    Chart(ChartProperties),
    /// Button family.
    Button(ButtonProperties),
}

impl VariantProperties {
    /// Family of this variant.
    #[must_use]
    pub const fn family(&self) -> PropertyFamily {
        match self {
            Self::Text(_) => PropertyFamily::Text,
            Self::Image(_) => PropertyFamily::Image,
            Self::Container(_) => PropertyFamily::Container,
            Self::Table(_) => PropertyFamily::Table,
            Self::Shape(_) => PropertyFamily::Shape,
            Self::Barcode(_) => PropertyFamily::Barcode,
            Self::Chart(_) => PropertyFamily::Chart,
            Self::Button(_) => PropertyFamily::Button,
        }
    }
}

/// Properties shared by every kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BaseProperties {
    /// Display label.
    pub name: String,
    /// Top-left corner.
    pub position: Position,
    /// Extent.
    pub size: Size,
    /// Rotation and scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Whether the element is drawn.
    pub visible: bool,
    /// Whether the element ignores interactive edits.
    pub locked: bool,
    /// Stacking order, higher paints on top.
    pub z_index: i32,
    /// Enclosing element. Reserved, no grouping operation sets it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ElementId>,
    /// Enclosed elements. Reserved, no grouping operation sets it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ElementId>>,
}

impl Default for BaseProperties {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Position::new(100.0, 100.0),
            size: Size::new(200.0, 100.0),
            transform: None,
            opacity: 1.0,
            visible: true,
            locked: false,
            z_index: 1,
            parent_id: None,
            children: None,
        }
    }
}

/// The complete, well-formed property set of one element.
///
/// Identity (`id`, `type`) is fixed at construction; the variant can only be
/// replaced by one of the same family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProperties")]
pub struct ElementProperties {
    id: ElementId,
    #[serde(rename = "type")]
    kind: ElementKind,
    /// Shared properties.
    #[serde(flatten)]
    pub base: BaseProperties,
    #[serde(flatten)]
    variant: VariantProperties,
}

/// Unchecked wire shape of [`ElementProperties`].
#[derive(Deserialize)]
struct RawProperties {
    id: ElementId,
    #[serde(rename = "type")]
    kind: ElementKind,
    #[serde(flatten)]
    base: BaseProperties,
    #[serde(flatten)]
    variant: VariantProperties,
}

impl TryFrom<RawProperties> for ElementProperties {
    type Error = TemplateError;

    fn try_from(raw: RawProperties) -> Result<Self, Self::Error> {
        check_family(raw.kind, &raw.variant)?;
        Ok(Self {
            id: raw.id,
            kind: raw.kind,
            base: raw.base,
            variant: raw.variant,
        })
    }
}

fn check_family(kind: ElementKind, variant: &VariantProperties) -> TemplateResult<()> {
    if kind.family() == variant.family() {
        Ok(())
    } else {
        Err(TemplateError::FamilyMismatch {
            kind,
            expected: kind.family(),
            found: variant.family(),
        })
    }
}

impl ElementProperties {
    /// Default properties for `kind` with the given identity.
    #[must_use]
    pub fn new(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            base: BaseProperties {
                name: kind.label().to_string(),
                ..BaseProperties::default()
            },
            variant: kind.default_variant(),
        }
    }

    /// Element identifier this property set belongs to.
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Element kind.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Kind-specific properties.
    #[must_use]
    pub fn variant(&self) -> &VariantProperties {
        &self.variant
    }

    /// Replace the kind-specific properties.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::FamilyMismatch`] if `variant` belongs to
    /// another family than this element's kind.
    pub fn set_variant(&mut self, variant: VariantProperties) -> TemplateResult<()> {
        check_family(self.kind, &variant)?;
        self.variant = variant;
        Ok(())
    }

    /// Bounding box ignoring rotation.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_box(self.base.position, self.base.size)
    }

    /// Shallow-merge a typed patch.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch carries non-finite numbers or a variant
    /// of the wrong family. Nothing is modified on error.
    pub fn apply_patch(&mut self, patch: &PropertyPatch) -> TemplateResult<()> {
        patch.validate()?;
        if let Some(variant) = &patch.variant {
            check_family(self.kind, variant)?;
        }
        let base = &mut self.base;
        if let Some(name) = &patch.name {
            base.name.clone_from(name);
        }
        if let Some(position) = patch.position {
            base.position = position;
        }
        if let Some(size) = patch.size {
            base.size = size;
        }
        if let Some(transform) = patch.transform {
            base.transform = Some(transform);
        }
        if let Some(opacity) = patch.opacity {
            base.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(visible) = patch.visible {
            base.visible = visible;
        }
        if let Some(locked) = patch.locked {
            base.locked = locked;
        }
        if let Some(z_index) = patch.z_index {
            base.z_index = z_index;
        }
        if let Some(variant) = &patch.variant {
            self.variant = variant.clone();
        }
        Ok(())
    }

    /// Merge loosely-typed JSON overrides, as carried by drag payloads and
    /// imported documents.
    ///
    /// Keys are matched against the wire names (`fontSize`, `position`, ...).
    /// Identity keys and keys no property of this kind understands are left
    /// out; their names are returned.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidProperties`] if a known key carries a
    /// value of the wrong shape. Nothing is modified on error.
    pub fn apply_json(&mut self, overrides: &Map<String, Value>) -> TemplateResult<Vec<String>> {
        let Value::Object(mut merged) = serde_json::to_value(&*self)? else {
            return Err(TemplateError::InvalidProperties(
                "properties did not serialize to an object".to_string(),
            ));
        };

        let mut ignored = Vec::new();
        let mut applied = Vec::new();
        for (key, value) in overrides {
            if PROTECTED_KEYS.contains(&key.as_str()) {
                ignored.push(key.clone());
                continue;
            }
            merged.insert(key.clone(), value.clone());
            if !value.is_null() {
                applied.push(key.as_str());
            }
        }

        let updated: Self = serde_json::from_value(Value::Object(merged))
            .map_err(|e| TemplateError::InvalidProperties(e.to_string()))?;

        if let Value::Object(known) = serde_json::to_value(&updated)? {
            ignored.extend(
                applied
                    .into_iter()
                    .filter(|key| !known.contains_key(*key))
                    .map(str::to_string),
            );
        }
        if !ignored.is_empty() {
            tracing::warn!(
                "Ignored unknown properties for {} element {}: {:?}",
                self.kind,
                self.id,
                ignored
            );
        }

        *self = updated;
        Ok(ignored)
    }
}

/// Partial update of an element's properties.
///
/// Every `Some` field replaces the current value; `variant` replaces the
/// kind-specific properties as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyPatch {
    /// New display label.
    pub name: Option<String>,
    /// New position.
    pub position: Option<Position>,
    /// New size.
    pub size: Option<Size>,
    /// New transform.
    pub transform: Option<Transform>,
    /// New opacity, clamped to `[0, 1]`.
    pub opacity: Option<f64>,
    /// New visibility.
    pub visible: Option<bool>,
    /// New lock state.
    pub locked: Option<bool>,
    /// New stacking order.
    pub z_index: Option<i32>,
    /// New kind-specific properties.
    pub variant: Option<VariantProperties>,
}

impl PropertyPatch {
    /// Patch that only moves.
    #[must_use]
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Patch that only resizes.
    #[must_use]
    pub fn size(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Patch that only replaces the transform.
    #[must_use]
    pub fn transform(transform: Transform) -> Self {
        Self {
            transform: Some(transform),
            ..Self::default()
        }
    }

    /// Patch that only replaces the variant properties.
    #[must_use]
    pub fn variant(variant: VariantProperties) -> Self {
        Self {
            variant: Some(variant),
            ..Self::default()
        }
    }

    /// Reject NaN and infinite numbers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::validation::ValidationError::NotFinite`] naming the
    /// offending field.
    pub fn validate(&self) -> TemplateResult<()> {
        use crate::validation::ValidationError;

        let not_finite =
            |field: &str| TemplateError::from(ValidationError::NotFinite(field.to_string()));
        if self.position.is_some_and(|p| !p.is_finite()) {
            return Err(not_finite("position"));
        }
        if self.size.is_some_and(|s| !s.is_finite()) {
            return Err(not_finite("size"));
        }
        if self.transform.is_some_and(|t| !t.is_finite()) {
            return Err(not_finite("transform"));
        }
        if self.opacity.is_some_and(|o| !o.is_finite()) {
            return Err(not_finite("opacity"));
        }
        Ok(())
    }
}

/// One positioned item in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementRecord", into = "ElementRecord")]
pub struct CanvasElement {
    properties: ElementProperties,
}

/// Wire shape `{ id, type, properties }`.
#[derive(Clone, Serialize, Deserialize)]
struct ElementRecord {
    id: ElementId,
    #[serde(rename = "type")]
    kind: ElementKind,
    properties: ElementProperties,
}

impl From<CanvasElement> for ElementRecord {
    fn from(element: CanvasElement) -> Self {
        Self {
            id: element.properties.id.clone(),
            kind: element.properties.kind,
            properties: element.properties,
        }
    }
}

impl TryFrom<ElementRecord> for CanvasElement {
    type Error = TemplateError;

    fn try_from(record: ElementRecord) -> Result<Self, Self::Error> {
        if record.id != record.properties.id || record.kind != record.properties.kind {
            return Err(TemplateError::InvalidProperties(format!(
                "element {} ({}) carries properties of {} ({})",
                record.id, record.kind, record.properties.id, record.properties.kind
            )));
        }
        Ok(Self {
            properties: record.properties,
        })
    }
}

impl CanvasElement {
    /// Create an element of `kind` at `position` with kind defaults and a
    /// fresh identifier.
    #[must_use]
    pub fn new(kind: ElementKind, position: Position) -> Self {
        Self::with_id(ElementId::new(), kind, position)
    }

    /// Create an element with an explicit identifier.
    #[must_use]
    pub fn with_id(id: ElementId, kind: ElementKind, position: Position) -> Self {
        let mut properties = ElementProperties::new(id, kind);
        properties.base.position = position;
        Self { properties }
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, size: Size) -> Self {
        self.properties.base.size = size;
        self
    }

    /// Set the stacking order.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.properties.base.z_index = z_index;
        self
    }

    /// Set the display label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.properties.base.name = name.into();
        self
    }

    /// Apply loosely-typed JSON overrides on top of the kind defaults.
    ///
    /// # Errors
    ///
    /// See [`ElementProperties::apply_json`].
    pub fn with_overrides(mut self, overrides: &Map<String, Value>) -> TemplateResult<Self> {
        self.properties.apply_json(overrides)?;
        Ok(self)
    }

    /// Element identifier.
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.properties.id
    }

    /// Element kind.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.properties.kind
    }

    /// Full property set.
    #[must_use]
    pub fn properties(&self) -> &ElementProperties {
        &self.properties
    }

    /// Mutable property set. Identity stays fixed.
    pub fn properties_mut(&mut self) -> &mut ElementProperties {
        &mut self.properties
    }

    /// Replace the whole property set, keeping identity.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidProperties`] if `properties` belongs to
    /// another element.
    pub fn replace_properties(&mut self, properties: ElementProperties) -> TemplateResult<()> {
        if properties.id != self.properties.id || properties.kind != self.properties.kind {
            return Err(TemplateError::InvalidProperties(format!(
                "cannot install properties of {} into {}",
                properties.id, self.properties.id
            )));
        }
        self.properties = properties;
        Ok(())
    }

    /// Shared properties.
    #[must_use]
    pub fn base(&self) -> &BaseProperties {
        &self.properties.base
    }

    /// Top-left corner.
    #[must_use]
    pub fn position(&self) -> Position {
        self.properties.base.position
    }

    /// Extent.
    #[must_use]
    pub fn size(&self) -> Size {
        self.properties.base.size
    }

    /// Stacking order.
    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.properties.base.z_index
    }

    /// Independent copy with a fresh identifier, shifted by `offset`.
    #[must_use]
    pub fn duplicate(&self, offset: Position) -> Self {
        let mut properties = self.properties.clone();
        properties.id = ElementId::new();
        properties.base.position = properties.base.position.offset(offset);
        Self { properties }
    }

    /// Check if a point is within this element's unrotated box.
    #[must_use]
    pub fn contains_point(&self, point: Position) -> bool {
        let b = self.properties.bounds();
        point.x >= b.min_x && point.x <= b.max_x && point.y >= b.min_y && point.y <= b.max_y
    }
}
