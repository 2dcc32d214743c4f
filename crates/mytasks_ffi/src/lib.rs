//! Flutter bridge crate for MyTasks.
//!
//! Dart bindings are generated from [`api`] by `flutter_rust_bridge_codegen`.

pub mod api;
