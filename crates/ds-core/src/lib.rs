pub mod document;
pub mod error;
pub mod id;
pub mod integrity;
pub mod model;
pub mod path;
pub mod query;

pub use document::{
    Document, DocumentConfig, DocumentSelection, ReorderDirection, add_layer, clone_subtree,
    create_document, detach_layer, duplicate_layer, insert_subtree, move_layer_to, remove_layer,
    reorder_layer, replace_layer, update_layer, with_selection,
};
pub use error::PathError;
pub use id::{DocumentId, LayerId};
pub use integrity::{IntegrityIssue, IssueSeverity, check_document, is_well_formed};
pub use model::*;
pub use path::{PropertyCategory, PropertyPath};
pub use query::{colors_by_tag, layers_with_tag, primary_color, text_by_tag, text_layers_by_tag};
