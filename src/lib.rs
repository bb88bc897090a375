pub mod builder;
pub mod config;
pub mod dom;
pub mod error;
pub mod fragment;
pub mod ftype;
pub mod markdown;
pub mod pm;
pub mod report;
pub mod slug;
pub mod template;

pub use builder::{BuildContext, FragmentBuilder, HeadingCounterState, RadioSpec};
pub use config::PmConfig;
pub use error::{BuildError, BuildResult};
pub use fragment::{Fragment, FragmentData, FragmentFields, Layout, ValidationError};
pub use ftype::FType;
pub use pm::{BuildOutput, Pm, PmBuilder};
pub use report::{BuildDiagnostic, BuildReport, DiagnosticKind};
pub use template::{IncludeTemplateRenderer, RawTemplateRenderer, TemplateError, TemplateRenderer};
