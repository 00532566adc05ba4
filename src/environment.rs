use crate::runtime::Runtime;

thread_local! {
    static RUNTIME: Runtime = Runtime::default();
}

pub fn with_runtime<R>(f: impl FnOnce(&Runtime) -> R) -> R {
    RUNTIME.with(f)
}
