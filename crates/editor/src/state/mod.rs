pub mod session;
pub mod settings;
pub mod store;

pub use session::{EditingSession, Mode, SaveStatus, SessionEvent};
pub use settings::{DisplaySettings, EditorSettings, ServerSettings};
pub use store::{cell_display_name, membership_label, Annotation, AnnotationStore, Membership};
