//! # Plume Extensions
//!
//! Built-in extensions and presets for the Plume extension manager.
//!
//! | Extension | Kind | Contributes |
//! |---|---|---|
//! | [`DocExtension`] | node | top node |
//! | [`TextExtension`] | node | inline text |
//! | [`ParagraphExtension`] | node | `insertParagraph` |
//! | [`HeadingExtension`] | node | `setHeadingLevel`, `insertHeading` |
//! | [`BoldExtension`] | mark | `toggleBold`, `setBold`, `removeBold`, `isBoldActive` |
//! | [`LinkExtension`] | mark | `updateLink`, `removeLink`, `getLinkHref`, `onClick` handler |
//! | [`NodeIdExtension`] | plain | dynamic `id` attribute |
//! | [`TextCommandsExtension`] | plain | text editing commands, `maxLength` plugin |
//! | [`EditorAttributesExtension`] | plain | editor element attributes |
//!
//! [`CorePreset`] bundles the extensions every editor needs and
//! [`FormattingPreset`] the inline marks.

mod args;
mod bold;
mod doc;
mod dom;
mod editor_attributes;
mod heading;
mod link;
mod node_id;
mod paragraph;
mod preset;
mod range;
mod text;
mod text_commands;

pub use bold::BoldExtension;
pub use doc::DocExtension;
pub use editor_attributes::EditorAttributesExtension;
pub use heading::HeadingExtension;
pub use link::LinkExtension;
pub use node_id::NodeIdExtension;
pub use paragraph::ParagraphExtension;
pub use preset::{CorePreset, FormattingPreset};
pub use range::{mark_in_range, marks_at};
pub use text::TextExtension;
pub use text_commands::TextCommandsExtension;
