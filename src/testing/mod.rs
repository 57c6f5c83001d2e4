//! Testing utilities: synthetic frames and scriptable collaborators for
//! offline testing without a camera or a vendor analyzer.

pub mod doubles;
pub mod synthetic_data;

pub use doubles::{engine_capture, AnalyzeCalls, FailingModel, ScriptedBackend, StaticModel};
pub use synthetic_data::{
    synthetic_barcode_frame, synthetic_blank_frame, synthetic_document_box,
    synthetic_document_frame,
};
