//! # Template Builder Core
//!
//! Editor state for a drag-and-drop document template builder: positioned
//! elements (text, shapes, images, tables, codes, charts, buttons) on a PDF
//! or email page, with selection, z-ordering, alignment, grid snapping and
//! bounded undo/redo.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                EditorSession                │
//! ├─────────────────────────────────────────────┤
//! │  Document        │  History                 │
//! │  - Elements      │  - Past / future stacks  │
//! │  - Order         │  - Full snapshots        │
//! │  Selection/View  │  Alignment               │
//! ├─────────────────────────────────────────────┤
//! │  XML contract    │  Drag payloads           │
//! │  Render lists    │  Template repository     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use template_core::{CanvasElement, EditorSession, ElementKind, Position};
//!
//! let mut session = EditorSession::new();
//! let text = CanvasElement::new(ElementKind::Text, Position::new(100.0, 100.0));
//! let id = session.add_element(text);
//! session
//!     .move_elements(&[id.clone()], Position::new(10.0, 5.0))
//!     .expect("finite delta");
//! session.undo();
//! assert_eq!(session.get_element(&id).map(|e| e.position()), Some(Position::new(100.0, 100.0)));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod align;
pub mod config;
pub mod dnd;
pub mod document;
pub mod element;
pub mod error;
pub mod geometry;
pub mod history;
pub mod render;
pub mod session;
pub mod store;
pub mod template;
pub mod validation;
pub mod view;
pub mod xml;

pub use align::Alignment;
pub use config::{EditorConfig, ZoomRange};
pub use dnd::DragPayload;
pub use document::Document;
pub use element::{
    BaseProperties, CanvasElement, ElementId, ElementKind, ElementProperties, PropertyFamily,
    PropertyPatch, VariantProperties,
};
pub use error::{TemplateError, TemplateResult};
pub use geometry::{Bounds, Color, Position, Size, Transform};
pub use history::{ActionKind, History, HistoryAction, Snapshot};
pub use render::{Primitive, RenderItem, RenderList, RenderSurface};
pub use session::EditorSession;
pub use store::{MemoryTemplateStore, StoreError, TemplateRepository};
pub use template::{PageSize, Template, TemplateFilter, TemplateType, Variable, VariableType};
pub use validation::ValidationError;
pub use view::{EditorMode, GuideOrientation, ViewState};
pub use xml::{export_xml, import_xml};

/// Template core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
