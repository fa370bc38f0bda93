//! TCP gateway hosting an [`Application`](crate::app::Application).

pub mod listener;
