// Multi-step workflows built from commands.

pub mod backlink;
pub mod contents;

pub use backlink::{BacklinkOutcome, BacklinkRequest, insert_backlink};
pub use contents::{REVISION_RULE, get_contents, is_content_type, walk};
