//! # Labelsmith - Label Composition Engine
//!
//! Labelsmith lays out printable food-batch labels: text, barcodes, QR codes,
//! shapes and images placed on a fixed-size canvas. It provides:
//!
//! - **Element store**: ordered, layered elements with snapshot undo/redo
//! - **Text fitting**: script-aware font sizing and box autosizing
//! - **Symbolic codes**: debounced, cached barcode and QR rasterization
//! - **Batch binding**: turning a batch record into a laid-out label
//! - **Canvas transforms**: constraint, proportional resize, snapping
//!
//! ## Quick Start
//!
//! ```no_run
//! use labelsmith::{
//!     EditorSession,
//!     batch::{FieldSelection, FlatRecord},
//!     element::BarcodeFormat,
//! };
//!
//! let mut session = EditorSession::default();
//!
//! let record: FlatRecord = [
//!     ("ItemKey".to_string(), "A1".to_string()),
//!     ("Lot_No".to_string(), "L-42".to_string()),
//! ]
//! .into_iter()
//! .collect();
//!
//! session.apply_batch(
//!     &record,
//!     &[
//!         FieldSelection::text("itemKey"),
//!         FieldSelection::barcode("batchNo", BarcodeFormat::Code128),
//!     ],
//! );
//!
//! let template = session.to_template();
//! println!("{}", template.to_json()?);
//! # Ok::<(), labelsmith::LabelError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`element`] | Element model and per-type properties |
//! | [`store`] | Element store with layer ordering and grouping |
//! | [`history`] | Snapshot undo/redo stacks |
//! | [`script`] | Unicode script classification |
//! | [`text_fit`] | Font fitting and autosizing |
//! | [`codes`] | Barcode/QR encoding and the debounced raster cache |
//! | [`batch`] | Alias resolution, row selection, label synthesis |
//! | [`canvas`] | Paper sizes, constraint, resize, snapping |
//! | [`template`] | Persisted template format |
//! | [`images`] | Runtime image handles |
//! | [`client`] | Template and batch backends |
//! | [`session`] | Editor session tying it all together |
//! | [`config`] | Engine configuration |
//! | [`error`] | Error types |

pub mod batch;
pub mod canvas;
pub mod client;
pub mod codes;
pub mod config;
pub mod element;
pub mod error;
pub mod history;
pub mod images;
pub mod script;
pub mod session;
pub mod store;
pub mod template;
pub mod text_fit;

// Re-exports for convenience
pub use canvas::CanvasSize;
pub use config::EngineConfig;
pub use element::{Element, ElementId, ElementKind};
pub use error::{LabelError, LabelResult};
pub use session::EditorSession;
pub use store::ElementStore;
pub use template::Template;
