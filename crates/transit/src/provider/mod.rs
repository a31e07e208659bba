//! Route data providers.

pub mod route_view;

pub use route_view::RouteView;
