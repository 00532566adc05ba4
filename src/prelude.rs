pub use crate::{
    app::*,
    component::{Component, Element},
    consume::{use_component, UseComponent},
    export::{export_component, ExportProps, Exporter, Setter},
    fingerprint::Shared,
    handler::Handler,
    hooks::{use_effect, use_event, use_handler, use_memo, use_ref, use_state, Ref, State},
    macros::{handler, match_on},
    terminal::{init_panic_hook, init_tui, restore_tui, run, RunConfig},
};
