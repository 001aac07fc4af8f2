pub mod loader_deps;
