pub mod app;
pub mod component;
pub mod consume;
pub mod environment;
pub mod export;
pub mod fingerprint;
pub mod handler;
pub mod hooks;
mod instance;
pub mod macros;
pub mod prelude;
pub mod runtime;
pub mod terminal;

pub use app::{App, MountedApp};
pub use component::{Component, Element};
pub use consume::{use_component, UseComponent};
pub use export::{export_component, ExportProps, Exporter, Setter};
pub use fingerprint::{fingerprint, Shared};
pub use handler::Handler;
pub use hooks::{
    use_effect, use_event, use_handler, use_hook, use_memo, use_ref, use_state, EffectCleanup,
    Ref, State,
};
pub use instance::InstanceId;
