pub mod action;
pub mod config;
pub mod ident;
pub mod snapshot;

pub use action::Action;
pub use config::{BindingMode, DesiredConfig, Strategy, Topology};
pub use ident::ServiceIdent;
pub use snapshot::ServiceSnapshot;
