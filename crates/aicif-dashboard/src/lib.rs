//! Headless AIC-IF dashboard: API loaders, view rendering and form controllers over a
//! [`document::Document`] port.

pub mod bootstrap;
pub mod chart;
pub mod config;
pub mod document;
pub mod error;
pub mod forms;
pub mod markup;
pub mod memory;
pub mod page;
pub mod render;
pub mod view;
pub mod widget;
