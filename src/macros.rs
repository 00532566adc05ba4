#[macro_export]
macro_rules! match_on {
    ($tp:ty, $pt:pat => $exp:expr) => {{
        $crate::hooks::use_event::<$tp>(move |ev| {
            match ev {
                $pt => { $exp; },
                _ => {},
            };
        });
    }};
    ($tp:ty, { $($pt:pat => $exp:expr,)* }) => {{
        $crate::hooks::use_event::<$tp>(move |ev| {
            match ev {
                $($pt => { $exp; },)*
                _ => {},
            };
        });
    }};
    ([$($s:ident),*], $tp:ty, { $($pt:pat => $exp:expr,)* }) => {{
        let ($($s),*) = ($($s.clone()),*);
        $crate::hooks::use_event::<$tp>(move |ev| {
            match ev {
                $($pt => { $exp; },)*
                _ => {},
            };
        });
    }};
}
pub use match_on;

#[macro_export]
macro_rules! handler {
    ([$($s:ident),*], $f:expr) => {{
        let ($($s),*) = ($($s.clone()),*);
        $crate::handler::Handler::new($f)
    }};
    ($f:expr) => {{
        $crate::handler::Handler::new($f)
    }};
}
pub use handler;
